use ndarray::{ArrayViewD, Axis, Dimension, ArrayView};
use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::json::FloatLiterals;

// Error Handling
#[derive(Debug)]
pub enum VisError {
    ShapeMismatch(String),
    InvalidArgument(String),
    OutOfBounds(String),
    InvalidComponentName(String),
    Config(String),
    Payload(String),
    Serialization(serde_json::Error),
    Io(std::io::Error),
}

impl std::fmt::Display for VisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VisError::ShapeMismatch(s) => write!(f, "Shape mismatch: {}", s),
            VisError::InvalidArgument(s) => write!(f, "Invalid argument: {}", s),
            VisError::OutOfBounds(s) => write!(f, "Out of bounds: {}", s),
            VisError::InvalidComponentName(s) => write!(f, "Invalid component name: {:?}", s),
            VisError::Config(s) => write!(f, "Configuration error: {}", s),
            VisError::Payload(s) => write!(f, "Invalid payload: {}", s),
            VisError::Serialization(e) => write!(f, "Serialization error: {}", e),
            VisError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for VisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VisError::Serialization(ref e) => Some(e),
            VisError::Io(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for VisError {
    fn from(err: serde_json::Error) -> VisError {
        VisError::Serialization(err)
    }
}

impl From<std::io::Error> for VisError {
    fn from(err: std::io::Error) -> VisError {
        VisError::Io(err)
    }
}

/// Borrowed n-dimensional array that serializes as nested JSON lists,
/// the layout the rendering bundle expects (`[[[0, 1], [0, 1]]]` rather than
/// ndarray's own `{"v":1,"dim":..,"data":..}` form). Float elements go through
/// [`FloatLiterals`], so non-finite values survive as `NaN`/`Infinity`.
#[derive(Debug, Clone)]
pub struct NestedArray<'a, A>(ArrayViewD<'a, A>);

impl<'a, A> NestedArray<'a, A> {
    pub fn new<D: Dimension>(view: ArrayView<'a, A, D>) -> Self {
        NestedArray(view.into_dyn())
    }

    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }
}

impl<A: Serialize> Serialize for NestedArray<'_, A> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_nested(self.0.view(), serializer)
    }
}

fn serialize_nested<A: Serialize, S: Serializer>(
    view: ArrayViewD<'_, A>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    if view.ndim() == 0 {
        return match view.iter().next() {
            Some(value) => value.serialize(FloatLiterals(serializer)),
            None => serializer.serialize_unit(),
        };
    }

    let mut seq = serializer.serialize_seq(Some(view.len_of(Axis(0))))?;
    for sub_view in view.outer_iter() {
        seq.serialize_element(&NestedArray(sub_view))?;
    }
    seq.end()
}

/// Copies caller tokens into the owned form stored in props.
pub fn to_token_vec<S: AsRef<str>>(tokens: &[S]) -> Vec<String> {
    tokens.iter().map(|t| t.as_ref().to_string()).collect()
}

pub(crate) fn check_len(what: &str, actual: usize, expected: usize) -> Result<(), VisError> {
    if actual != expected {
        return Err(VisError::ShapeMismatch(format!(
            "{} has length {}, expected {}",
            what, actual, expected
        )));
    }
    Ok(())
}

pub(crate) fn check_ndim(what: &str, shape: &[usize], expected: usize) -> Result<(), VisError> {
    if shape.len() != expected {
        return Err(VisError::ShapeMismatch(format!(
            "{} must have {} dimensions, got shape {:?}",
            what, expected, shape
        )));
    }
    Ok(())
}

pub(crate) fn check_range(min_value: Option<f64>, max_value: Option<f64>) -> Result<(), VisError> {
    if let (Some(min), Some(max)) = (min_value, max_value) {
        if min > max {
            return Err(VisError::InvalidArgument(format!(
                "min_value ({}) is greater than max_value ({})",
                min, max
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr0, arr1, Array3};

    #[test]
    fn test_nested_array_three_dims() -> Result<(), Box<dyn std::error::Error>> {
        let attention = Array3::from_shape_vec((1, 2, 2), vec![0, 1, 0, 1])?;
        let json = serde_json::to_string(&NestedArray::new(attention.view()))?;
        assert_eq!(json, "[[[0,1],[0,1]]]");
        Ok(())
    }

    #[test]
    fn test_nested_array_keeps_float_elements() -> Result<(), Box<dyn std::error::Error>> {
        let values = arr1(&[0.5f32, -1.25]);
        let json = serde_json::to_string(&NestedArray::new(values.view()))?;
        assert_eq!(json, "[0.5,-1.25]");
        Ok(())
    }

    #[test]
    fn test_nested_array_scalar_and_empty() -> Result<(), Box<dyn std::error::Error>> {
        let scalar = arr0(3u8);
        assert_eq!(serde_json::to_string(&NestedArray::new(scalar.view()))?, "3");

        let empty = Array3::<f32>::zeros((2, 0, 4));
        assert_eq!(serde_json::to_string(&NestedArray::new(empty.view()))?, "[[],[]]");
        Ok(())
    }

    #[test]
    fn test_nested_array_non_standard_layout() -> Result<(), Box<dyn std::error::Error>> {
        let matrix = ndarray::arr2(&[[1, 2], [3, 4]]);
        let transposed = matrix.t();
        let json = serde_json::to_string(&NestedArray::new(transposed))?;
        assert_eq!(json, "[[1,3],[2,4]]");
        Ok(())
    }

    #[test]
    fn test_nested_array_non_finite_literals() -> Result<(), VisError> {
        let values = arr1(&[f32::NEG_INFINITY, f32::NAN, 0.5, f32::INFINITY]);
        let json = crate::json::to_python_json(&NestedArray::new(values.view()))?;
        assert_eq!(json, "[-Infinity, NaN, 0.5, Infinity]");
        Ok(())
    }

    #[test]
    fn test_check_helpers() {
        assert!(check_len("tokens", 2, 2).is_ok());
        match check_len("tokens", 3, 2) {
            Err(VisError::ShapeMismatch(msg)) => assert_eq!(msg, "tokens has length 3, expected 2"),
            other => panic!("Expected ShapeMismatch, got {:?}", other),
        }
        assert!(check_range(Some(0.0), Some(1.0)).is_ok());
        assert!(check_range(None, Some(1.0)).is_ok());
        assert!(matches!(check_range(Some(2.0), Some(1.0)), Err(VisError::InvalidArgument(_))));

        assert!(check_ndim("attention", &[1, 2, 2], 3).is_ok());
        match check_ndim("attention", &[2, 2], 3) {
            Err(VisError::ShapeMismatch(msg)) => {
                assert_eq!(msg, "attention must have 3 dimensions, got shape [2, 2]")
            }
            other => panic!("Expected ShapeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error;
        let io = VisError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        assert!(io.source().is_some());
        assert_eq!(io.to_string(), "IO error: missing");
        assert!(VisError::Config("bad".to_string()).source().is_none());
        assert_eq!(VisError::Payload("bad".to_string()).to_string(), "Invalid payload: bad");
    }
}
