//! Integration tests for the mood analysis engine

use approx::{assert_abs_diff_eq, assert_relative_eq};
use mood_dsp::{
    analyze, analyze_batch, analyze_track, analyze_with_config, cosine_similarity,
    cosine_similarity_by_path, distance, distance_by_path, AnalysisConfig, AnalysisError,
    Classification, ForceVector, Track, TrackTags,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Noise bursts every `period` seconds over a quiet noise floor
fn burst_signal(seconds: f32, sample_rate: u32, period: f32, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = (seconds * sample_rate as f32) as usize;
    let burst = (0.08 * sample_rate as f32) as usize;
    let stride = (period * sample_rate as f32) as usize;
    (0..n)
        .map(|i| {
            let noise: f32 = rng.gen_range(-1.0..1.0);
            if i % stride < burst {
                noise * 0.8
            } else {
                noise * 0.05
            }
        })
        .collect()
}

fn write_wav_i16(path: &Path, channels: u16, sample_rate: u32, mono: &[f32]) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in mono {
        let v = (s * i16::MAX as f32) as i16;
        for _ in 0..channels {
            writer.write_sample(v).unwrap();
        }
    }
    writer.finalize().unwrap();
}

fn write_wav_samples(path: &Path, channels: u16, sample_rate: u32, samples: &[i16]) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
}

/// Insert a RIFF `LIST/INFO` chunk in front of the `data` chunk
fn add_info_chunk(path: &Path, entries: &[(&[u8; 4], &str)]) {
    let bytes = std::fs::read(path).unwrap();

    let mut info = b"INFO".to_vec();
    for (id, value) in entries {
        let mut text = value.as_bytes().to_vec();
        text.push(0);
        if text.len() % 2 == 1 {
            text.push(0);
        }
        info.extend_from_slice(&id[..]);
        info.extend_from_slice(&(text.len() as u32).to_le_bytes());
        info.extend_from_slice(&text);
    }
    let mut list = b"LIST".to_vec();
    list.extend_from_slice(&(info.len() as u32).to_le_bytes());
    list.extend_from_slice(&info);

    // Chunks start after the 12-byte RIFF header
    let mut pos = 12;
    while &bytes[pos..pos + 4] != b"data" {
        let size = u32::from_le_bytes(bytes[pos + 4..pos + 8].try_into().unwrap()) as usize;
        pos += 8 + size + size % 2;
    }

    let mut out = bytes[..pos].to_vec();
    out.extend_from_slice(&list);
    out.extend_from_slice(&bytes[pos..]);
    let riff_size = (out.len() - 8) as u32;
    out[4..8].copy_from_slice(&riff_size.to_le_bytes());
    std::fs::write(path, out).unwrap();
}

/// Four seconds of stereo 22050 Hz material: independent LCG noise per
/// channel, loud for 80 ms of every 500 ms. Integer-only, so the samples are
/// identical on every platform.
fn reference_samples() -> Vec<i16> {
    let mut state: u32 = 0x1234_5678;
    let mut next = move || {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        (state >> 16) as i32 - 32768
    };

    let frames = 4 * 22050;
    let mut samples = Vec::with_capacity(frames * 2);
    for frame in 0..frames {
        let divisor = if frame % 11025 < 1764 { 2 } else { 16 };
        let left = next() / divisor;
        let right = next() / divisor;
        samples.push(left as i16);
        samples.push(right as i16);
    }
    samples
}

fn write_wav_i32(path: &Path, sample_rate: u32, samples: &[i32]) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
}

/// Stereo 22050 Hz fixture with bursts every half second
fn stereo_fixture(dir: &TempDir, name: &str, seed: u64) -> PathBuf {
    let path = dir.path().join(name);
    let signal = burst_signal(6.0, 22050, 0.5, seed);
    write_wav_i16(&path, 2, 22050, &signal);
    path
}

fn fast_config() -> AnalysisConfig {
    AnalysisConfig {
        tempo_bands: 4,
        ..AnalysisConfig::default()
    }
}

#[test]
fn test_track_info_end_to_end() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = stereo_fixture(&dir, "stereo.wav", 1);

    let track = Track::decode(&path, &AnalysisConfig::default()).unwrap();
    let info = track.info();

    assert_eq!(info.channels, 2);
    assert_eq!(info.sample_rate, 22050);
    assert_eq!(info.n_samples, 6 * 22050 * 2);
    assert_eq!(info.bytes_per_sample, 2);
    assert_eq!(info.duration, 6);
    assert!(!info.resampled);

    // PCM reports its stream rate, not the file-size average
    assert_eq!(info.bitrate, 22050 * 2 * 16);

    // hound writes no tags
    assert_eq!(info.tags, TrackTags::default());
    assert_eq!(info.tags.title, "<no title>");
}

#[test]
fn test_wide_samples_are_narrowed_to_16_bit() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wide.wav");

    let mut rng = StdRng::seed_from_u64(7);
    let samples: Vec<i32> = (0..22050).map(|_| rng.gen_range(-(1 << 30)..(1 << 30))).collect();
    write_wav_i32(&path, 22050, &samples);

    let track = Track::decode(&path, &AnalysisConfig::default()).unwrap();
    assert!(!track.info().resampled);
    assert_eq!(track.n_samples(), samples.len());
    assert_eq!(track.info().bitrate, 22050 * 32);

    let reference: Vec<u8> = samples
        .iter()
        .flat_map(|&s| ((s >> 16) as i16).to_le_bytes())
        .collect();
    let expected = Sha256::digest(&reference);
    let actual = Sha256::digest(track.to_le_bytes());
    assert_eq!(actual, expected);
}

#[test]
fn test_other_rates_are_resampled() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cd_rate.wav");
    let signal = burst_signal(2.0, 44100, 0.5, 3);
    write_wav_i16(&path, 1, 44100, &signal);

    let track = Track::decode(&path, &AnalysisConfig::default()).unwrap();
    let info = track.info();
    assert!(info.resampled);
    assert_eq!(info.sample_rate, 22050);
    assert_eq!(info.channels, 1);
    assert_eq!(info.duration, 2);
    assert_eq!(info.bitrate, 44100 * 16);

    let expected = 2 * 22050;
    let n = track.n_samples();
    assert!(
        n > expected * 9 / 10 && n < expected * 11 / 10,
        "expected about {} samples, got {}",
        expected,
        n
    );
}

#[test]
fn test_riff_info_tags_end_to_end() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tagged.wav");
    let signal = burst_signal(1.0, 22050, 0.5, 9);
    write_wav_i16(&path, 2, 22050, &signal);
    add_info_chunk(
        &path,
        &[
            (b"IART", "Some Artist"),
            (b"INAM", "Some Title"),
            (b"IPRD", "Some Album"),
            (b"IGNR", "Rock"),
        ],
    );

    let track = Track::decode(&path, &AnalysisConfig::default()).unwrap();
    let tags = &track.info().tags;
    assert_eq!(tags.artist, "Some Artist");
    assert_eq!(tags.title, "Some Title");
    assert_eq!(tags.album, "Some Album");
    assert_eq!(tags.genre, "Rock");
    assert_eq!(tags.track_number, "");

    // The extra chunk changes neither the samples nor the bit rate
    assert_eq!(track.n_samples(), 22050 * 2);
    assert_eq!(track.info().bitrate, 22050 * 2 * 16);
}

#[test]
fn test_reference_force_vector() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reference.wav");
    write_wav_samples(&path, 2, 22050, &reference_samples());

    let analysis = analyze(&path).unwrap();
    assert_eq!(analysis.info.channels, 2);
    assert_eq!(analysis.info.sample_rate, 22050);
    assert_eq!(analysis.info.n_samples, 4 * 22050 * 2);
    assert_eq!(analysis.info.duration, 4);
    assert_eq!(analysis.info.bitrate, 705_600);

    let v = analysis.force_vector;
    assert_abs_diff_eq!(v.tempo, 2.934_691, epsilon = 1e-5);
    assert_abs_diff_eq!(v.amplitude, -10.841_049, epsilon = 1e-5);
    assert_abs_diff_eq!(v.frequency, 21.031_265, epsilon = 1e-5);
    assert_abs_diff_eq!(v.attack, -55.669_739, epsilon = 1e-5);
    assert_eq!(analysis.classification, Classification::Loud);

    // Bursts every 0.5 s: the fundamental and its first two harmonics
    let df = 2.0 * 22050.0 / 253.0 / 694.0;
    let bins: Vec<f64> = analysis.tempo.peaks.iter().map(|p| p.frequency_hz / df).collect();
    assert_eq!(bins.len(), 3);
    for (bin, expected) in bins.iter().zip([8.0, 16.0, 24.0]) {
        assert_abs_diff_eq!(*bin, expected, epsilon = 1e-9);
    }
}

#[test]
fn test_missing_file_fails_every_time() {
    for _ in 0..3 {
        let result = analyze("/no/such/dir/track.mp3");
        assert!(matches!(result, Err(AnalysisError::OpenFailure(_))));
    }
}

#[test]
fn test_non_audio_file_has_no_stream() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "these are not the samples you are looking for").unwrap();

    let result = Track::decode(&path, &AnalysisConfig::default());
    assert!(matches!(result, Err(AnalysisError::StreamNotFound(_))));
}

#[test]
fn test_silent_file_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("silence.wav");
    write_wav_i16(&path, 1, 22050, &vec![0.0; 22050 * 2]);

    let result = analyze(&path);
    assert!(matches!(result, Err(AnalysisError::DegenerateInput(_))));
}

#[test]
fn test_analysis_is_deterministic() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = stereo_fixture(&dir, "repeat.wav", 11);
    let config = fast_config();

    let first = analyze_with_config(&path, &config).unwrap();
    let second = analyze_with_config(&path, &config).unwrap();

    assert_eq!(first.force_vector, second.force_vector);
    assert_eq!(first.force, second.force);
    assert_eq!(first.classification, second.classification);
    assert_eq!(first.info, second.info);

    for component in first.force_vector.as_array() {
        assert!(component.is_finite());
    }
}

#[test]
fn test_classification_follows_force() {
    let dir = TempDir::new().unwrap();
    let path = stereo_fixture(&dir, "classify.wav", 5);

    let analysis = analyze_with_config(&path, &fast_config()).unwrap();
    assert_relative_eq!(analysis.force, analysis.force_vector.force());
    let expected = if analysis.force > 0.0 {
        Classification::Loud
    } else if analysis.force < 0.0 {
        Classification::Calm
    } else {
        Classification::Unknown
    };
    assert_eq!(analysis.classification, expected);
}

#[test]
fn test_parallel_and_sequential_agree() {
    let dir = TempDir::new().unwrap();
    let path = stereo_fixture(&dir, "joined.wav", 17);
    let parallel = fast_config();
    let sequential = AnalysisConfig {
        parallel_analyzers: false,
        ..fast_config()
    };

    let track = Track::decode(&path, &parallel).unwrap();
    let (a, tempo_a) = analyze_track(&track, &parallel).unwrap();
    let (b, tempo_b) = analyze_track(&track, &sequential).unwrap();
    assert_eq!(a, b);
    assert_eq!(tempo_a, tempo_b);
}

#[test]
fn test_batch_keeps_input_order() {
    let dir = TempDir::new().unwrap();
    let good_a = stereo_fixture(&dir, "a.wav", 21);
    let missing = dir.path().join("missing.wav");
    let good_b = stereo_fixture(&dir, "b.wav", 22);

    let paths = vec![good_a.clone(), missing, good_b.clone()];
    let results = analyze_batch(&paths, &fast_config());

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().info.path, good_a);
    assert!(matches!(results[1], Err(AnalysisError::OpenFailure(_))));
    assert_eq!(results[2].as_ref().unwrap().info.path, good_b);
}

#[test]
fn test_distance_of_file_to_itself() {
    let dir = TempDir::new().unwrap();
    let path = stereo_fixture(&dir, "self.wav", 31);

    let d = distance_by_path(&path, &path).unwrap();
    assert_eq!(d, 0.0);

    if let Some(cos) = cosine_similarity_by_path(&path, &path).unwrap() {
        assert_relative_eq!(cos, 1.0, epsilon = 1e-5);
    }
}

#[test]
fn test_distance_by_path_propagates_errors() {
    let dir = TempDir::new().unwrap();
    let path = stereo_fixture(&dir, "ok.wav", 41);
    let result = distance_by_path(path.as_path(), Path::new("/no/such/file.ogg"));
    assert!(matches!(result, Err(AnalysisError::OpenFailure(_))));
}

fn random_vector(rng: &mut StdRng) -> ForceVector {
    ForceVector::from_array([
        rng.gen_range(-10.0..10.0),
        rng.gen_range(-10.0..10.0),
        rng.gen_range(-10.0..10.0),
        rng.gen_range(-10.0..10.0),
    ])
}

#[test]
fn test_metric_laws_on_random_vectors() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..200 {
        let a = random_vector(&mut rng);
        let b = random_vector(&mut rng);
        let c = random_vector(&mut rng);

        assert_eq!(distance(&a, &a), 0.0);
        assert!(distance(&a, &b) >= 0.0);
        assert_eq!(distance(&a, &b), distance(&b, &a));
        assert!(distance(&a, &c) <= distance(&a, &b) + distance(&b, &c) + 1e-4);

        let cos = cosine_similarity(&a, &b).unwrap();
        assert!((-1.0..=1.0).contains(&cos));
        assert_eq!(Some(cos), cosine_similarity(&b, &a));
        assert_relative_eq!(cosine_similarity(&a, &a).unwrap(), 1.0, epsilon = 1e-5);
    }
}

#[test]
fn test_cosine_of_zero_vector_is_undefined() {
    let zero = ForceVector::default();
    let v = ForceVector::from_array([1.0, 2.0, 3.0, 4.0]);
    assert_eq!(cosine_similarity(&zero, &v), None);
    assert_eq!(distance(&zero, &v), 30.0f32.sqrt());
}
