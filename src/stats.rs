use std::cmp::Ordering;

/// Describe-flavor summary of one numeric sample: count, mean, sample
/// standard deviation, min/quartiles/max and every modal value.
#[derive(Debug, Clone, PartialEq)]
pub struct Describe {
    pub count: usize,
    pub mean: f64,
    /// Undefined for a single observation.
    pub std: Option<f64>,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
    pub modes: Vec<f64>,
}

pub fn describe(values: &[f64]) -> Option<Describe> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let count = sorted.len();
    let mean = sorted.iter().sum::<f64>() / count as f64;
    let std = if count > 1 {
        let variance =
            sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        Some(variance.sqrt())
    } else {
        None
    };

    Some(Describe {
        count,
        mean,
        std,
        min: sorted[0],
        q25: percentile(&sorted, 0.25),
        median: percentile(&sorted, 0.50),
        q75: percentile(&sorted, 0.75),
        max: sorted[count - 1],
        modes: modes(&sorted),
    })
}

/// Linear-interpolation percentile over an ascending-sorted, non-empty
/// sample. `q` in `[0, 1]`.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        sorted[lower] + (pos - lower as f64) * (sorted[upper] - sorted[lower])
    }
}

/// All values sharing the highest multiplicity, ascending. Run-length over
/// the sorted sample.
fn modes(sorted: &[f64]) -> Vec<f64> {
    let mut best = 1;
    let mut found: Vec<f64> = Vec::new();
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i + 1;
        while j < sorted.len() && sorted[j] == sorted[i] {
            j += 1;
        }
        let run = j - i;
        if run > best {
            best = run;
            found.clear();
            found.push(sorted[i]);
        } else if run == best {
            found.push(sorted[i]);
        }
        i = j;
    }
    found
}
