// Copyright 2024 Nathan Hoos
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
#![cfg(feature = "python_bindings")]
//! Thin PyO3 wrappers over [`crate::map::Map`] and [`crate::set::Set`]. Pickling hands
//! the raw FST image back and forth rather than going through a text format: the image
//! is already the canonical on-disk representation, so there is nothing for a
//! serialization layer to add.

use crate::map::Map;
use crate::output::Output;
use crate::ops::Select;
use crate::set::Set;
use pyo3::exceptions::{PyKeyError, PyValueError};
use pyo3::prelude::*;
use pyo3::wrap_pyfunction;

fn select_from_str(name: &str) -> PyResult<Select> {
    match name {
        "first" => Ok(Select::First),
        "last" => Ok(Select::Last),
        "mid" => Ok(Select::Mid),
        "min" => Ok(Select::Min),
        "max" => Ok(Select::Max),
        "avg" => Ok(Select::Avg),
        "median" => Ok(Select::Median),
        other => Err(PyValueError::new_err(format!("unknown select policy: {}", other))),
    }
}

#[pyclass(name = "Map", module = "ducer")]
pub struct PyMap {
    inner: Map,
}

#[pymethods]
impl PyMap {
    #[new]
    pub fn new(path: &str) -> PyResult<Self> {
        Map::open(path).map(|inner| PyMap { inner }).map_err(|e| PyValueError::new_err(e.to_string()))
    }

    #[staticmethod]
    pub fn build(path: &str, items: Vec<(Vec<u8>, Output)>) -> PyResult<Self> {
        Map::build(path, items).map(|inner| PyMap { inner }).map_err(|e| PyValueError::new_err(e.to_string()))
    }

    pub fn __len__(&self) -> usize {
        self.inner.len() as usize
    }

    pub fn get(&self, key: Vec<u8>) -> PyResult<Option<Output>> {
        self.inner.get(key).map_err(|e| PyValueError::new_err(e.to_string()))
    }

    pub fn __getitem__(&self, key: Vec<u8>) -> PyResult<Output> {
        self.inner.index(&key).map_err(|_| PyKeyError::new_err(key))
    }

    pub fn __contains__(&self, key: Vec<u8>) -> PyResult<bool> {
        self.inner.contains_key(key).map_err(|e| PyValueError::new_err(e.to_string()))
    }

    pub fn items(&self) -> PyResult<Vec<(Vec<u8>, Output)>> {
        let mut it = self.inner.iter().map_err(|e| PyValueError::new_err(e.to_string()))?;
        let mut out = Vec::new();
        while let Some(pair) = it.next().map_err(|e| PyValueError::new_err(e.to_string()))? {
            out.push(pair);
        }
        Ok(out)
    }

    #[staticmethod]
    #[pyo3(signature = (path, operands, select="first"))]
    pub fn union(path: &str, operands: Vec<PyRef<PyMap>>, select: &str) -> PyResult<Self> {
        let refs: Vec<&Map> = operands.iter().map(|m| &m.inner).collect();
        Map::union(path, &refs, select_from_str(select)?)
            .map(|inner| PyMap { inner })
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    #[staticmethod]
    #[pyo3(signature = (path, operands, select="first"))]
    pub fn intersection(path: &str, operands: Vec<PyRef<PyMap>>, select: &str) -> PyResult<Self> {
        let refs: Vec<&Map> = operands.iter().map(|m| &m.inner).collect();
        Map::intersection(path, &refs, select_from_str(select)?)
            .map(|inner| PyMap { inner })
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    #[staticmethod]
    #[pyo3(signature = (path, operands, select="first"))]
    pub fn difference(path: &str, operands: Vec<PyRef<PyMap>>, select: &str) -> PyResult<Self> {
        let refs: Vec<&Map> = operands.iter().map(|m| &m.inner).collect();
        Map::difference(path, &refs, select_from_str(select)?)
            .map(|inner| PyMap { inner })
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    #[staticmethod]
    #[pyo3(signature = (path, operands, select="first"))]
    pub fn symmetric_difference(path: &str, operands: Vec<PyRef<PyMap>>, select: &str) -> PyResult<Self> {
        let refs: Vec<&Map> = operands.iter().map(|m| &m.inner).collect();
        Map::symmetric_difference(path, &refs, select_from_str(select)?)
            .map(|inner| PyMap { inner })
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    pub fn __getstate__<'py>(&self, py: Python<'py>) -> Bound<'py, pyo3::types::PyBytes> {
        pyo3::types::PyBytes::new_bound(py, self.inner.as_bytes())
    }

    pub fn __setstate__(&mut self, state: Vec<u8>) -> PyResult<()> {
        self.inner = Map::from_bytes(state).map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(())
    }
}

#[pyclass(name = "Set", module = "ducer")]
pub struct PySet {
    inner: Set,
}

#[pymethods]
impl PySet {
    #[new]
    pub fn new(path: &str) -> PyResult<Self> {
        Set::open(path).map(|inner| PySet { inner }).map_err(|e| PyValueError::new_err(e.to_string()))
    }

    #[staticmethod]
    pub fn build(path: &str, items: Vec<Vec<u8>>) -> PyResult<Self> {
        Set::build(path, items).map(|inner| PySet { inner }).map_err(|e| PyValueError::new_err(e.to_string()))
    }

    pub fn __len__(&self) -> usize {
        self.inner.len() as usize
    }

    pub fn __contains__(&self, key: Vec<u8>) -> PyResult<bool> {
        self.inner.contains(key).map_err(|e| PyValueError::new_err(e.to_string()))
    }

    pub fn keys(&self) -> PyResult<Vec<Vec<u8>>> {
        let mut it = self.inner.iter().map_err(|e| PyValueError::new_err(e.to_string()))?;
        let mut out = Vec::new();
        while let Some(k) = it.next().map_err(|e| PyValueError::new_err(e.to_string()))? {
            out.push(k);
        }
        Ok(out)
    }

    pub fn is_disjoint(&self, other: PyRef<PySet>) -> PyResult<bool> {
        self.inner.is_disjoint(&other.inner).map_err(|e| PyValueError::new_err(e.to_string()))
    }

    pub fn is_subset(&self, other: PyRef<PySet>) -> PyResult<bool> {
        self.inner.is_subset(&other.inner).map_err(|e| PyValueError::new_err(e.to_string()))
    }

    pub fn is_superset(&self, other: PyRef<PySet>) -> PyResult<bool> {
        self.inner.is_superset(&other.inner).map_err(|e| PyValueError::new_err(e.to_string()))
    }

    #[staticmethod]
    pub fn union(path: &str, operands: Vec<PyRef<PySet>>) -> PyResult<Self> {
        let refs: Vec<&Set> = operands.iter().map(|s| &s.inner).collect();
        Set::union(path, &refs).map(|inner| PySet { inner }).map_err(|e| PyValueError::new_err(e.to_string()))
    }

    #[staticmethod]
    pub fn intersection(path: &str, operands: Vec<PyRef<PySet>>) -> PyResult<Self> {
        let refs: Vec<&Set> = operands.iter().map(|s| &s.inner).collect();
        Set::intersection(path, &refs).map(|inner| PySet { inner }).map_err(|e| PyValueError::new_err(e.to_string()))
    }

    #[staticmethod]
    pub fn difference(path: &str, operands: Vec<PyRef<PySet>>) -> PyResult<Self> {
        let refs: Vec<&Set> = operands.iter().map(|s| &s.inner).collect();
        Set::difference(path, &refs).map(|inner| PySet { inner }).map_err(|e| PyValueError::new_err(e.to_string()))
    }

    #[staticmethod]
    pub fn symmetric_difference(path: &str, operands: Vec<PyRef<PySet>>) -> PyResult<Self> {
        let refs: Vec<&Set> = operands.iter().map(|s| &s.inner).collect();
        Set::symmetric_difference(path, &refs)
            .map(|inner| PySet { inner })
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    pub fn __getstate__<'py>(&self, py: Python<'py>) -> Bound<'py, pyo3::types::PyBytes> {
        pyo3::types::PyBytes::new_bound(py, self.inner.as_bytes())
    }

    pub fn __setstate__(&mut self, state: Vec<u8>) -> PyResult<()> {
        self.inner = Set::from_bytes(state).map_err(|e| PyValueError::new_err(e.to_string()))?;
        Ok(())
    }
}

#[pyfunction(name = "memory_sentinel")]
pub(crate) fn memory_sentinel_py() -> &'static str {
    crate::source::MEMORY_SENTINEL
}

#[pymodule]
pub fn ducer(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(memory_sentinel_py, m)?)?;
    m.add_class::<PyMap>()?;
    m.add_class::<PySet>()?;
    Ok(())
}
