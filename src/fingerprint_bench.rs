// src/fingerprint_bench.rs
// Measures fingerprint derivation throughput for raw image payloads and detector landmarks.
use rand::Rng;
use std::time::Instant;

use faceguard::crypto::{BoundingBox, FaceLandmarks, FingerprintDeriver, Keypoint};

fn main() -> anyhow::Result<()> {
    let num_images = 200;
    let payload_size = 256 * 1024;
    let num_landmark_sets = 1_000;
    println!(
        "--- Fingerprint benchmark: {} images of {} KiB, {} landmark sets ---",
        num_images,
        payload_size / 1024,
        num_landmark_sets
    );

    let deriver = FingerprintDeriver::new();
    let mut rng = rand::thread_rng();

    // Payload generation is kept out of the timed section.
    let images: Vec<Vec<u8>> = (0..num_images)
        .map(|_| (0..payload_size).map(|_| rng.gen::<u8>()).collect())
        .collect();
    let landmark_sets: Vec<FaceLandmarks> = (0..num_landmark_sets)
        .map(|_| FaceLandmarks {
            keypoints: (0..68)
                .map(|_| Keypoint {
                    x: rng.gen_range(0.0..640.0),
                    y: rng.gen_range(0.0..480.0),
                })
                .collect(),
            bounding_box: BoundingBox {
                width: rng.gen_range(50.0..400.0),
                height: rng.gen_range(50.0..400.0),
            },
        })
        .collect();

    let start_time = Instant::now();
    let mut last = None;
    for image in &images {
        last = Some(deriver.derive(image)?);
    }
    let image_duration = start_time.elapsed();

    let start_time = Instant::now();
    for landmarks in &landmark_sets {
        deriver.derive_landmarks(landmarks)?;
    }
    let landmark_duration = start_time.elapsed();

    let total_mib = (num_images * payload_size) as f64 / (1024.0 * 1024.0);
    println!("\n--- Results ---");
    if let Some(fp) = last {
        println!("Last image fingerprint: {}", fp);
    }
    println!(
        "Images:    {} ms total, {:.2} µs per image, {:.1} MiB/s",
        image_duration.as_millis(),
        image_duration.as_micros() as f64 / num_images as f64,
        total_mib / image_duration.as_secs_f64()
    );
    println!(
        "Landmarks: {} ms total, {:.2} µs per set",
        landmark_duration.as_millis(),
        landmark_duration.as_micros() as f64 / num_landmark_sets as f64
    );
    Ok(())
}
