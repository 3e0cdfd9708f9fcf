use crate::error::{Error, Result};

/// One labeled input.
///
/// - `values`   — the input vector fed to the network
/// - `expected` — the training target: one-hot of the label for classifiers, the input itself
///                for autoencoders
/// - `label`    — class index, only used for accuracy reporting
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub values: Vec<f64>,
    pub expected: Vec<f64>,
    pub label: usize,
}

impl Sample {
    pub fn new(values: Vec<f64>, expected: Vec<f64>, label: usize) -> Sample {
        Sample { values, expected, label }
    }

    /// Classification sample with a one-hot target of length `classes`.
    pub fn classification(values: Vec<f64>, label: usize, classes: usize) -> Result<Sample> {
        if label >= classes {
            return Err(Error::InvalidArgument(format!(
                "label {label} is out of range for {classes} classes"
            )));
        }
        let mut expected = vec![0.0; classes];
        expected[label] = 1.0;
        Ok(Sample { values, expected, label })
    }

    /// Autoencoder sample: the target is the input itself.
    pub fn reconstruction(values: Vec<f64>, label: usize) -> Sample {
        Sample {
            expected: values.clone(),
            values,
            label,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_target_is_one_hot() {
        let s = Sample::classification(vec![0.0; 4], 2, 5).unwrap();
        assert_eq!(s.expected, vec![0.0, 0.0, 1.0, 0.0, 0.0]);
        assert!(Sample::classification(vec![0.0; 4], 5, 5).is_err());
    }

    #[test]
    fn reconstruction_target_is_input() {
        let s = Sample::reconstruction(vec![0.1, 0.9], 7);
        assert_eq!(s.expected, s.values);
        assert_eq!(s.label, 7);
    }
}
