//! Fields over a mesh and collections of realizations
//!
//! A [`Field`] stores one `vertex_count × dimension` value matrix; a
//! [`ProcessSample`] stores N of them on a shared mesh. Flattening is always
//! vertex-major then component (`i * dimension + j`), which is the order the
//! quadrature weights are broadcast in.

use crate::error::{KLError, Result};
use crate::mesh::Mesh;
use nalgebra::{DMatrix, DVector};
use std::sync::Arc;

/// Values of a (possibly vector-valued) function at every mesh vertex
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    mesh: Arc<Mesh>,
    values: DMatrix<f64>,
}

impl Field {
    /// Create a field from a `vertex_count × dimension` value matrix
    pub fn new(mesh: Arc<Mesh>, values: DMatrix<f64>) -> Result<Self> {
        if values.nrows() != mesh.vertex_count() {
            return Err(KLError::ShapeMismatch {
                what: "field vertex count",
                expected: mesh.vertex_count(),
                found: values.nrows(),
            });
        }
        check_dimension(values.ncols())?;
        Ok(Self { mesh, values })
    }

    /// Scalar field from one value per vertex
    pub fn from_scalar_values(mesh: Arc<Mesh>, values: &[f64]) -> Result<Self> {
        let n = values.len();
        Self::new(mesh, DMatrix::from_column_slice(n, 1, values))
    }

    /// Rebuild a field from its vertex-major flattening
    pub fn from_flat(mesh: Arc<Mesh>, dimension: usize, flat: &[f64]) -> Result<Self> {
        let expected = mesh.vertex_count() * dimension;
        if flat.len() != expected {
            return Err(KLError::ShapeMismatch {
                what: "flattened field length",
                expected,
                found: flat.len(),
            });
        }
        let values = DMatrix::from_row_slice(mesh.vertex_count(), dimension, flat);
        Self::new(mesh, values)
    }

    /// Construct without validation; callers guarantee the shape
    pub(crate) fn from_parts(mesh: Arc<Mesh>, values: DMatrix<f64>) -> Self {
        debug_assert_eq!(values.nrows(), mesh.vertex_count());
        Self { mesh, values }
    }

    /// Zero field with `dimension` components
    ///
    /// # Errors
    /// `ShapeMismatch` if `dimension` is zero.
    pub fn zeros(mesh: Arc<Mesh>, dimension: usize) -> Result<Self> {
        check_dimension(dimension)?;
        let n = mesh.vertex_count();
        Ok(Self::from_parts(mesh, DMatrix::zeros(n, dimension)))
    }

    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    pub fn into_values(self) -> DMatrix<f64> {
        self.values
    }

    pub fn vertex_count(&self) -> usize {
        self.values.nrows()
    }

    /// Number of components per vertex
    pub fn dimension(&self) -> usize {
        self.values.ncols()
    }

    /// Vertex-major flattening of the values
    pub fn flatten(&self) -> DVector<f64> {
        flatten_values(&self.values)
    }
}

/// Vertex-major flattening: entry `(i, j)` lands at `i * ncols + j`
pub(crate) fn flatten_values(values: &DMatrix<f64>) -> DVector<f64> {
    // The transpose is stored column-major, i.e. row-major for `values`.
    DVector::from_column_slice(values.transpose().as_slice())
}

fn check_dimension(dimension: usize) -> Result<()> {
    if dimension == 0 {
        return Err(KLError::ShapeMismatch {
            what: "field dimension",
            expected: 1,
            found: 0,
        });
    }
    Ok(())
}

fn same_mesh(a: &Arc<Mesh>, b: &Arc<Mesh>) -> bool {
    Arc::ptr_eq(a, b) || **a == **b
}

/// Ordered collection of realizations sharing one mesh and one dimension
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSample {
    mesh: Arc<Mesh>,
    dimension: usize,
    realizations: Vec<DMatrix<f64>>,
}

impl ProcessSample {
    /// Empty sample of `dimension`-valued fields
    ///
    /// # Errors
    /// `ShapeMismatch` if `dimension` is zero.
    pub fn new(mesh: Arc<Mesh>, dimension: usize) -> Result<Self> {
        check_dimension(dimension)?;
        Ok(Self {
            mesh,
            dimension,
            realizations: Vec::new(),
        })
    }

    /// Construct without validation; callers guarantee every shape
    pub(crate) fn from_parts(mesh: Arc<Mesh>, dimension: usize, realizations: Vec<DMatrix<f64>>) -> Self {
        debug_assert!(realizations
            .iter()
            .all(|v| v.shape() == (mesh.vertex_count(), dimension)));
        Self {
            mesh,
            dimension,
            realizations,
        }
    }

    /// Build a sample from fields on a common mesh
    ///
    /// The first field fixes the mesh and the dimension.
    pub fn from_fields(fields: Vec<Field>) -> Result<Self> {
        let first = fields.first().ok_or(KLError::EmptySample)?;
        let mut sample = Self::new(first.mesh.clone(), first.dimension())?;
        for field in fields {
            sample.add_field(field)?;
        }
        Ok(sample)
    }

    /// Append a `vertex_count × dimension` value matrix
    pub fn add(&mut self, values: DMatrix<f64>) -> Result<()> {
        self.check_shape(self.realizations.len(), &values)?;
        self.realizations.push(values);
        Ok(())
    }

    /// Append a field; it must live on the same mesh
    pub fn add_field(&mut self, field: Field) -> Result<()> {
        if !same_mesh(&self.mesh, &field.mesh) {
            return Err(KLError::InvalidMesh(
                "field is defined on a different mesh than the sample".to_string(),
            ));
        }
        self.add(field.values)
    }

    /// Replace realization `index`
    pub fn set_field(&mut self, index: usize, values: DMatrix<f64>) -> Result<()> {
        if index >= self.realizations.len() {
            return Err(KLError::ShapeMismatch {
                what: "realization index",
                expected: self.realizations.len(),
                found: index,
            });
        }
        self.check_shape(index, &values)?;
        self.realizations[index] = values;
        Ok(())
    }

    fn check_shape(&self, index: usize, values: &DMatrix<f64>) -> Result<()> {
        let expected = (self.mesh.vertex_count(), self.dimension);
        let found = values.shape();
        if found != expected {
            return Err(KLError::DimensionMismatch {
                index,
                expected,
                found,
            });
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&DMatrix<f64>> {
        self.realizations.get(index)
    }

    pub fn get_field(&self, index: usize) -> Option<Field> {
        self.realizations
            .get(index)
            .map(|values| Field::from_parts(self.mesh.clone(), values.clone()))
    }

    pub fn realizations(&self) -> &[DMatrix<f64>] {
        &self.realizations
    }

    pub fn iter(&self) -> impl Iterator<Item = &DMatrix<f64>> {
        self.realizations.iter()
    }

    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    /// Number of realizations
    pub fn len(&self) -> usize {
        self.realizations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.realizations.is_empty()
    }

    /// Pointwise mean over realizations
    pub fn compute_mean(&self) -> Result<Field> {
        if self.is_empty() {
            return Err(KLError::EmptySample);
        }
        let mut sum = DMatrix::zeros(self.vertex_count(), self.dimension);
        for values in &self.realizations {
            sum += values;
        }
        sum /= self.len() as f64;
        Ok(Field::from_parts(self.mesh.clone(), sum))
    }

    /// Mean over vertices of each realization, one row per realization
    pub fn compute_spatial_mean(&self) -> DMatrix<f64> {
        let mut means = DMatrix::zeros(self.len(), self.dimension);
        for (r, values) in self.realizations.iter().enumerate() {
            for j in 0..self.dimension {
                means[(r, j)] = values.column(j).mean();
            }
        }
        means
    }

    /// Sample restricted to one output component
    pub fn marginal(&self, component: usize) -> Result<ProcessSample> {
        if component >= self.dimension {
            return Err(KLError::ShapeMismatch {
                what: "marginal component",
                expected: self.dimension,
                found: component,
            });
        }
        Ok(Self {
            mesh: self.mesh.clone(),
            dimension: 1,
            realizations: self
                .realizations
                .iter()
                .map(|values| values.columns(component, 1).into_owned())
                .collect(),
        })
    }
}
