//! Named multi-axis arrays
//!
//! A [`NamedArray`] is a dense, rectangular container whose axes carry a name
//! and an ordered label set fixed at construction. Every combination of labels
//! holds a value; "not applicable" combinations hold an explicit zero or
//! sentinel rather than a hole. Lookups outside the declared labels fail with
//! [`CepError::KeyNotFound`].
//!
//! The same container carries input tables (costs, node limits), decision
//! variable handles during assembly, and solved values afterwards. Storage,
//! views, axis sums and broadcasting are delegated to `ndarray`.

use std::collections::HashMap;
use std::fmt;

use ndarray::{ArrayD, ArrayViewD, Axis as NdAxis, Dimension, IxDyn};
use serde::{Deserialize, Serialize};

use crate::error::{CepError, CepResult};

/// A single axis label: integer for years, steps and periods, string otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Int(i64),
    Str(String),
}

impl Label {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Label::Str(s) => Some(s),
            Label::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Label::Int(i) => Some(*i),
            Label::Str(_) => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Int(i) => write!(f, "{}", i),
            Label::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label::Str(s.to_string())
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Label::Str(s)
    }
}

impl From<&String> for Label {
    fn from(s: &String) -> Self {
        Label::Str(s.clone())
    }
}

impl From<i64> for Label {
    fn from(i: i64) -> Self {
        Label::Int(i)
    }
}

impl From<i32> for Label {
    fn from(i: i32) -> Self {
        Label::Int(i as i64)
    }
}

impl From<usize> for Label {
    fn from(i: usize) -> Self {
        Label::Int(i as i64)
    }
}

/// A named axis with an ordered, duplicate-free label set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "AxisRepr", into = "AxisRepr")]
pub struct Axis {
    name: String,
    labels: Vec<Label>,
    lookup: HashMap<Label, usize>,
}

#[derive(Serialize, Deserialize)]
struct AxisRepr {
    name: String,
    labels: Vec<Label>,
}

impl TryFrom<AxisRepr> for Axis {
    type Error = CepError;

    fn try_from(repr: AxisRepr) -> Result<Self, Self::Error> {
        Axis::new(repr.name, repr.labels)
    }
}

impl From<Axis> for AxisRepr {
    fn from(axis: Axis) -> Self {
        AxisRepr {
            name: axis.name,
            labels: axis.labels,
        }
    }
}

impl PartialEq for Axis {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.labels == other.labels
    }
}

impl Eq for Axis {}

impl Axis {
    pub fn new<L: Into<Label>>(
        name: impl Into<String>,
        labels: impl IntoIterator<Item = L>,
    ) -> CepResult<Self> {
        let name = name.into();
        let labels: Vec<Label> = labels.into_iter().map(Into::into).collect();
        let mut lookup = HashMap::with_capacity(labels.len());
        for (pos, label) in labels.iter().enumerate() {
            if lookup.insert(label.clone(), pos).is_some() {
                return Err(CepError::InvalidData(format!(
                    "duplicate label '{}' on axis '{}'",
                    label, name
                )));
            }
        }
        Ok(Self {
            name,
            labels,
            lookup,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains(&self, label: &Label) -> bool {
        self.lookup.contains_key(label)
    }

    pub fn position(&self, label: &Label) -> Option<usize> {
        self.lookup.get(label).copied()
    }

    /// Position of `label`, or `KeyNotFound` naming this axis.
    pub fn index_of(&self, label: &Label) -> CepResult<usize> {
        self.position(label)
            .ok_or_else(|| CepError::key_not_found(self.name.clone(), label.clone()))
    }
}

/// Dense array addressed by one label per named axis.
///
/// Values live in an [`ndarray::ArrayD`] kept in standard (row-major) layout;
/// the axes translate labels into positions on top of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "ArrayRepr<T>",
    into = "ArrayRepr<T>",
    bound(serialize = "T: Clone + Serialize", deserialize = "T: Deserialize<'de>")
)]
pub struct NamedArray<T> {
    axes: Vec<Axis>,
    data: ArrayD<T>,
}

#[derive(Serialize, Deserialize)]
struct ArrayRepr<T> {
    axes: Vec<Axis>,
    data: Vec<T>,
}

impl<T> TryFrom<ArrayRepr<T>> for NamedArray<T> {
    type Error = CepError;

    fn try_from(repr: ArrayRepr<T>) -> Result<Self, Self::Error> {
        NamedArray::new(repr.axes, repr.data)
    }
}

impl<T: Clone> From<NamedArray<T>> for ArrayRepr<T> {
    fn from(array: NamedArray<T>) -> Self {
        let data = array.values().to_vec();
        ArrayRepr {
            axes: array.axes,
            data,
        }
    }
}

fn check_axis_names(axes: &[Axis]) -> CepResult<()> {
    for (i, axis) in axes.iter().enumerate() {
        if axes[..i].iter().any(|a| a.name() == axis.name()) {
            return Err(CepError::AxisMismatch(format!(
                "axis '{}' declared twice",
                axis.name()
            )));
        }
    }
    Ok(())
}

fn shape_of(axes: &[Axis]) -> IxDyn {
    IxDyn(&axes.iter().map(Axis::len).collect::<Vec<_>>())
}

fn no_axis(name: &str) -> CepError {
    CepError::AxisMismatch(format!("array has no axis '{}'", name))
}

impl<T> NamedArray<T> {
    /// Wrap row-major `data` laid out over `axes`.
    pub fn new(axes: Vec<Axis>, data: Vec<T>) -> CepResult<Self> {
        check_axis_names(&axes)?;
        let shape = shape_of(&axes);
        let len = data.len();
        let data = ArrayD::from_shape_vec(shape, data).map_err(|_| {
            CepError::AxisMismatch(format!(
                "data length {} does not match shape {:?}",
                len,
                axes.iter().map(Axis::len).collect::<Vec<_>>()
            ))
        })?;
        Ok(Self { axes, data })
    }

    /// Attach `axes` to an ndarray result, restoring standard layout.
    fn from_array(axes: Vec<Axis>, data: ArrayD<T>) -> Self
    where
        T: Clone,
    {
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Self { axes, data }
    }

    pub fn filled(axes: Vec<Axis>, value: T) -> CepResult<Self>
    where
        T: Clone,
    {
        check_axis_names(&axes)?;
        let data = ArrayD::from_elem(shape_of(&axes), value);
        Ok(Self { axes, data })
    }

    /// Build by evaluating `f` on every label combination, in row-major order.
    pub fn from_fn(axes: Vec<Axis>, mut f: impl FnMut(&[&Label]) -> T) -> CepResult<Self> {
        let shape = shape_of(&axes);
        let values = ndarray::indices(shape)
            .into_iter()
            .map(|ix| {
                let key: Vec<&Label> = ix
                    .slice()
                    .iter()
                    .zip(&axes)
                    .map(|(&p, axis)| &axis.labels[p])
                    .collect();
                f(&key)
            })
            .collect();
        Self::new(axes, values)
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn axis_names(&self) -> Vec<&str> {
        self.axes.iter().map(Axis::name).collect()
    }

    fn axis_position(&self, name: &str) -> CepResult<usize> {
        self.axes
            .iter()
            .position(|a| a.name() == name)
            .ok_or_else(|| no_axis(name))
    }

    pub fn axis(&self, name: &str) -> CepResult<&Axis> {
        Ok(&self.axes[self.axis_position(name)?])
    }

    pub fn axis_labels(&self, name: &str) -> CepResult<&[Label]> {
        self.axis(name).map(Axis::labels)
    }

    pub fn shape(&self) -> Vec<usize> {
        self.data.shape().to_vec()
    }

    pub fn ndim(&self) -> usize {
        self.axes.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Values in row-major order.
    pub fn values(&self) -> &[T] {
        // every constructor leaves the data in standard layout
        self.data.as_slice().unwrap_or(&[])
    }

    /// The underlying ndarray, axes in declaration order.
    pub fn view(&self) -> ArrayViewD<'_, T> {
        self.data.view()
    }

    fn check_arity(&self, n: usize) -> CepResult<()> {
        if n != self.axes.len() {
            return Err(CepError::AxisMismatch(format!(
                "expected {} indices ({}), got {}",
                self.axes.len(),
                self.axis_names().join(", "),
                n
            )));
        }
        Ok(())
    }

    fn position(&self, key: &[Label]) -> CepResult<IxDyn> {
        self.check_arity(key.len())?;
        let pos = self
            .axes
            .iter()
            .zip(key)
            .map(|(axis, label)| axis.index_of(label))
            .collect::<CepResult<Vec<_>>>()?;
        Ok(IxDyn(&pos))
    }

    fn checked_position(&self, pos: &[usize]) -> CepResult<IxDyn> {
        self.check_arity(pos.len())?;
        for (axis, &p) in self.axes.iter().zip(pos) {
            if p >= axis.len() {
                return Err(CepError::key_not_found(axis.name(), p));
            }
        }
        Ok(IxDyn(pos))
    }

    pub fn get(&self, key: &[Label]) -> CepResult<&T> {
        let ix = self.position(key)?;
        Ok(&self.data[ix])
    }

    pub fn get_mut(&mut self, key: &[Label]) -> CepResult<&mut T> {
        let ix = self.position(key)?;
        Ok(&mut self.data[ix])
    }

    pub fn set(&mut self, key: &[Label], value: T) -> CepResult<()> {
        *self.get_mut(key)? = value;
        Ok(())
    }

    pub fn get_at(&self, pos: &[usize]) -> CepResult<&T> {
        let ix = self.checked_position(pos)?;
        Ok(&self.data[ix])
    }

    pub fn set_at(&mut self, pos: &[usize], value: T) -> CepResult<()> {
        let ix = self.checked_position(pos)?;
        self.data[ix] = value;
        Ok(())
    }

    /// Iterate `(labels, value)` pairs in row-major order.
    pub fn indexed_iter(&self) -> impl Iterator<Item = (Vec<&Label>, &T)> + '_ {
        self.data.indexed_iter().map(move |(ix, value)| {
            let key = ix
                .slice()
                .iter()
                .zip(&self.axes)
                .map(|(&p, axis)| &axis.labels[p])
                .collect();
            (key, value)
        })
    }

    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> NamedArray<U> {
        NamedArray {
            axes: self.axes.clone(),
            data: self.data.map(f),
        }
    }

    /// Fix some axes to a label and return the remaining lower-dimensional array.
    ///
    /// Axes not named in `fixed` keep their order. The result owns a copy of
    /// the selected values.
    pub fn slice(&self, fixed: &[(&str, Label)]) -> CepResult<NamedArray<T>>
    where
        T: Clone,
    {
        let mut pinned: Vec<(usize, usize)> = Vec::with_capacity(fixed.len());
        for (name, label) in fixed {
            let i = self.axis_position(name)?;
            pinned.push((i, self.axes[i].index_of(label)?));
        }
        // highest axis first so the remaining axis numbers stay valid
        pinned.sort_by(|a, b| b.0.cmp(&a.0));
        pinned.dedup_by_key(|p| p.0);
        let mut view = self.data.view();
        for &(i, p) in &pinned {
            view = view.index_axis_move(NdAxis(i), p);
        }
        let kept = self
            .axes
            .iter()
            .enumerate()
            .filter(|(i, _)| pinned.iter().all(|(j, _)| j != i))
            .map(|(_, a)| a.clone())
            .collect();
        Ok(NamedArray::from_array(kept, view.to_owned()))
    }
}

impl NamedArray<f64> {
    pub fn zeros(axes: Vec<Axis>) -> CepResult<Self> {
        Self::filled(axes, 0.0)
    }

    pub fn sum(&self) -> f64 {
        self.data.sum()
    }

    /// Collapse `axis` by summation.
    pub fn sum_over(&self, axis: &str) -> CepResult<NamedArray<f64>> {
        let idx = self.axis_position(axis)?;
        let kept = self
            .axes
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .map(|(_, a)| a.clone())
            .collect();
        Ok(NamedArray::from_array(kept, self.data.sum_axis(NdAxis(idx))))
    }

    /// Element-wise sum. `other` may omit axes of `self`; it is broadcast over
    /// them. Shared axes must carry identical labels.
    pub fn add(&self, other: &NamedArray<f64>) -> CepResult<NamedArray<f64>> {
        let mut mapping = Vec::with_capacity(other.axes.len());
        for axis in &other.axes {
            let i = self.axis_position(axis.name()).map_err(|_| {
                CepError::AxisMismatch(format!(
                    "cannot broadcast: axis '{}' missing from left operand",
                    axis.name()
                ))
            })?;
            if self.axes[i] != *axis {
                return Err(CepError::AxisMismatch(format!(
                    "axis '{}' has different labels in the two operands",
                    axis.name()
                )));
            }
            mapping.push(i);
        }

        // reorder `other` to follow `self`, then give it unit axes where it has none
        let mut order: Vec<usize> = (0..mapping.len()).collect();
        order.sort_by_key(|&j| mapping[j]);
        let mut aligned = other.data.view().permuted_axes(IxDyn(&order));
        for i in 0..self.axes.len() {
            if !mapping.contains(&i) {
                aligned = aligned.insert_axis(NdAxis(i));
            }
        }
        let broadcast = aligned.broadcast(self.data.raw_dim()).ok_or_else(|| {
            CepError::AxisMismatch(format!(
                "cannot broadcast {:?} onto {:?}",
                other.shape(),
                self.shape()
            ))
        })?;
        Ok(NamedArray::from_array(
            self.axes.clone(),
            &self.data + &broadcast,
        ))
    }
}
