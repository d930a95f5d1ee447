//! Read-only views of a module's float parameters, keyed by module path
//! (`net.weight`, `encoder.layers.0.ffn.bias`, ...).

use burn::module::{Module, ModuleVisitor, Param};
use burn::prelude::*;

/// Path and dimensions of one float parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamShape {
    pub path: String,
    pub dims: Vec<usize>,
}

/// Host copy of a 2-D weight matrix, row-major over `dims`.
#[derive(Debug, Clone)]
pub struct WeightSnapshot {
    pub path: String,
    pub dims: Vec<usize>,
    pub values: Vec<f32>,
}

impl WeightSnapshot {
    pub fn rows(&self) -> usize {
        self.dims[0]
    }

    pub fn cols(&self) -> usize {
        self.dims[1]
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.values[row * self.cols() + col]
    }

    /// Same matrix with rows and columns swapped.
    pub fn transposed(&self) -> Self {
        let (rows, cols) = (self.rows(), self.cols());
        let mut values = Vec::with_capacity(self.values.len());
        for c in 0..cols {
            for r in 0..rows {
                values.push(self.values[r * cols + c]);
            }
        }
        Self {
            path: self.path.clone(),
            dims: vec![cols, rows],
            values,
        }
    }

    /// `(min, max)` over all values.
    pub fn range(&self) -> (f32, f32) {
        self.values
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }
}

#[derive(Default)]
struct Inventory {
    path: Vec<String>,
    shapes: Vec<ParamShape>,
    weights: Option<Vec<WeightSnapshot>>,
}

impl Inventory {
    fn current_path(&self) -> String {
        self.path.join(".")
    }
}

impl<B: Backend> ModuleVisitor<B> for Inventory {
    fn enter_module(&mut self, name: &str, _container_type: &str) {
        self.path.push(name.to_string());
    }

    fn exit_module(&mut self, _name: &str, _container_type: &str) {
        self.path.pop();
    }

    fn visit_float<const D: usize>(&mut self, param: &Param<Tensor<B, D>>) {
        let path = self.current_path();
        let tensor = param.val();
        let dims = tensor.dims().to_vec();

        if let Some(weights) = self.weights.as_mut() {
            if D == 2 && path.ends_with("weight") {
                let values: Vec<f32> = tensor.into_data().iter::<f32>().collect();
                weights.push(WeightSnapshot {
                    path: path.clone(),
                    dims: dims.clone(),
                    values,
                });
            }
        }
        self.shapes.push(ParamShape { path, dims });
    }
}

/// Every float parameter in visiting order.
pub fn parameter_shapes<B: Backend, M: Module<B>>(model: &M) -> Vec<ParamShape> {
    let mut inventory = Inventory::default();
    model.visit(&mut inventory);
    inventory.shapes
}

/// Host copies of every 2-D parameter whose path ends in `weight`.
pub fn weight_snapshots<B: Backend, M: Module<B>>(model: &M) -> Vec<WeightSnapshot> {
    let mut inventory = Inventory {
        weights: Some(Vec::new()),
        ..Default::default()
    };
    model.visit(&mut inventory);
    inventory.weights.unwrap_or_default()
}

/// Describe the first difference between two shape inventories.
pub fn shape_mismatch(expected: &[ParamShape], found: &[ParamShape]) -> Option<String> {
    if expected.len() != found.len() {
        return Some(format!(
            "expected {} parameters, found {}",
            expected.len(),
            found.len()
        ));
    }
    expected.iter().zip(found).find_map(|(want, got)| {
        if want == got {
            None
        } else {
            Some(format!(
                "parameter '{}' has shape {:?}, model expects '{}' with shape {:?}",
                got.path, got.dims, want.path, want.dims
            ))
        }
    })
}
