use ndarray::{Array1, Array2};

/// Three well separated 2-D clusters of 20 points each, labels 0, 1, 2.
pub fn three_blobs() -> (Array2<f64>, Array1<usize>) {
    let centers = [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)];
    let mut data = Vec::new();
    let mut labels = Vec::new();
    for (class, (cx, cy)) in centers.iter().enumerate() {
        for i in 0..20 {
            data.push(cx + (i % 5) as f64 * 0.3);
            data.push(cy + (i / 5) as f64 * 0.3);
            labels.push(class);
        }
    }
    (
        Array2::from_shape_vec((60, 2), data).unwrap(),
        Array1::from_vec(labels),
    )
}
