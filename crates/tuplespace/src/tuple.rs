// SPDX-License-Identifier: LGPL-2.1-or-later
// Copyright (C) 2025 Shahzad A. Bhatti <bhatti@plexobject.com>
//
// This file is part of LindaSpaces.
//
// LindaSpaces is free software: you can redistribute it and/or modify
// it under the terms of the GNU Lesser General Public License as published by
// the Free Software Foundation, either version 2.1 of the License, or
// (at your option) any later version.
//
// LindaSpaces is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public License
// along with LindaSpaces. If not, see <https://www.gnu.org/licenses/>.

//! Tuples, templates and the matching predicate
//!
//! ## Purpose
//! Value representation for the space. A [`Tuple`] is an immutable,
//! fixed-arity sequence of typed fields. A [`Template`] has the same shape but
//! each field is either an exact value or a bare type marker that matches any
//! value of that runtime type.
//!
//! ## Matching
//! `tuple.matches(&template)` is true iff the arities are equal and every
//! position satisfies its rule:
//! - `TemplateField::Exact(v)`: the tuple field equals `v`
//! - `TemplateField::Type(t)`: the tuple field's runtime type is `t`
//!
//! Field order is significant. There is no fuzzy or partial matching.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A tuple in the space
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tuple {
    fields: Vec<TupleField>,
}

impl Tuple {
    /// Create a new tuple from fields
    pub fn new(fields: Vec<TupleField>) -> Self {
        Tuple { fields }
    }

    /// Get the fields of the tuple
    pub fn fields(&self) -> &[TupleField] {
        &self.fields
    }

    /// Number of fields
    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    /// Check if tuple matches a template
    pub fn matches(&self, template: &Template) -> bool {
        template.matches(self)
    }

    /// Build the template that matches exactly this tuple
    pub fn to_template(&self) -> Template {
        Template::new(
            self.fields
                .iter()
                .cloned()
                .map(TemplateField::Exact)
                .collect(),
        )
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_fields(f, &self.fields)
    }
}

/// Field in a tuple
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TupleField {
    /// Integer value
    Integer(i64),
    /// String value
    String(String),
    /// Boolean value
    Boolean(bool),
    /// Binary data
    Binary(Vec<u8>),
    /// Floating point
    Float(OrderedFloat),
    /// Null value
    Null,
}

impl TupleField {
    /// Runtime type of this value
    pub fn field_type(&self) -> FieldType {
        match self {
            TupleField::Integer(_) => FieldType::Integer,
            TupleField::String(_) => FieldType::String,
            TupleField::Boolean(_) => FieldType::Boolean,
            TupleField::Binary(_) => FieldType::Binary,
            TupleField::Float(_) => FieldType::Float,
            TupleField::Null => FieldType::Null,
        }
    }
}

impl fmt::Display for TupleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TupleField::Integer(v) => write!(f, "{}", v),
            TupleField::String(v) => write!(f, "{:?}", v),
            TupleField::Boolean(v) => write!(f, "{}", v),
            TupleField::Binary(bytes) => {
                write!(f, "0x")?;
                for b in bytes {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
            TupleField::Float(v) => write!(f, "{:?}", v.get()),
            TupleField::Null => write!(f, "null"),
        }
    }
}

/// Float wrapper with bit-exact equality so fields can be `Eq` and `Hash`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderedFloat(f64);

impl OrderedFloat {
    /// Create a new OrderedFloat from a float value
    pub fn new(value: f64) -> Self {
        OrderedFloat(value)
    }

    /// Get the inner float value
    pub fn get(&self) -> f64 {
        self.0
    }
}

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for OrderedFloat {}

impl PartialOrd for OrderedFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedFloat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

/// Runtime type of a field, used as a wildcard marker in templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FieldType {
    /// Integer type
    Integer,
    /// String type
    String,
    /// Boolean type
    Boolean,
    /// Binary data type
    Binary,
    /// Floating point type
    Float,
    /// Null/empty type
    Null,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Integer => "Integer",
            FieldType::String => "String",
            FieldType::Boolean => "Boolean",
            FieldType::Binary => "Binary",
            FieldType::Float => "Float",
            FieldType::Null => "Null",
        };
        f.write_str(name)
    }
}

/// Template for matching tuples
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Template {
    fields: Vec<TemplateField>,
}

impl Template {
    /// Create a new template
    pub fn new(fields: Vec<TemplateField>) -> Self {
        Template { fields }
    }

    /// Get the template fields
    pub fn fields(&self) -> &[TemplateField] {
        &self.fields
    }

    /// Number of fields
    pub fn arity(&self) -> usize {
        self.fields.len()
    }

    /// Check if a tuple matches this template
    pub fn matches(&self, tuple: &Tuple) -> bool {
        if self.fields.len() != tuple.fields.len() {
            return false;
        }

        self.fields
            .iter()
            .zip(tuple.fields.iter())
            .all(|(template_field, field)| template_field.matches(field))
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_fields(f, &self.fields)
    }
}

/// Field in a template
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateField {
    /// Exact value match
    Exact(TupleField),
    /// Any value of the given runtime type
    Type(FieldType),
}

impl TemplateField {
    /// Check if a field matches this template field
    pub fn matches(&self, field: &TupleField) -> bool {
        match self {
            TemplateField::Exact(expected) => field == expected,
            TemplateField::Type(field_type) => field.field_type() == *field_type,
        }
    }
}

impl fmt::Display for TemplateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateField::Exact(value) => fmt::Display::fmt(value, f),
            TemplateField::Type(field_type) => fmt::Display::fmt(field_type, f),
        }
    }
}

fn write_fields<T: fmt::Display>(f: &mut fmt::Formatter<'_>, fields: &[T]) -> fmt::Result {
    write!(f, "(")?;
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", field)?;
    }
    write!(f, ")")
}

/// Build a [`Tuple`] from values convertible into [`TupleField`]
///
/// ```
/// use lindaspaces_tuplespace::{tuple, TupleField};
/// let t = tuple!(4, "hello", true);
/// assert_eq!(t.fields()[1], TupleField::String("hello".to_string()));
/// ```
#[macro_export]
macro_rules! tuple {
    ($($field:expr),* $(,)?) => {
        $crate::Tuple::new(vec![$($crate::TupleField::from($field)),*])
    };
}

/// Build a [`Template`]; values become exact fields, [`FieldType`]s become type markers
///
/// ```
/// use lindaspaces_tuplespace::{template, tuple, FieldType};
/// let t = template!(FieldType::Integer, "hello");
/// assert!(tuple!(7, "hello").matches(&t));
/// ```
#[macro_export]
macro_rules! template {
    ($($field:expr),* $(,)?) => {
        $crate::Template::new(vec![$($crate::TemplateField::from($field)),*])
    };
}

// Conversion traits
impl From<i64> for TupleField {
    fn from(val: i64) -> Self {
        TupleField::Integer(val)
    }
}

impl From<i32> for TupleField {
    fn from(val: i32) -> Self {
        TupleField::Integer(i64::from(val))
    }
}

impl From<String> for TupleField {
    fn from(val: String) -> Self {
        TupleField::String(val)
    }
}

impl From<&str> for TupleField {
    fn from(val: &str) -> Self {
        TupleField::String(val.to_string())
    }
}

impl From<bool> for TupleField {
    fn from(val: bool) -> Self {
        TupleField::Boolean(val)
    }
}

impl From<Vec<u8>> for TupleField {
    fn from(val: Vec<u8>) -> Self {
        TupleField::Binary(val)
    }
}

impl From<f64> for TupleField {
    fn from(val: f64) -> Self {
        TupleField::Float(OrderedFloat(val))
    }
}

impl From<FieldType> for TemplateField {
    fn from(val: FieldType) -> Self {
        TemplateField::Type(val)
    }
}

impl From<TupleField> for TemplateField {
    fn from(val: TupleField) -> Self {
        TemplateField::Exact(val)
    }
}

impl From<i64> for TemplateField {
    fn from(val: i64) -> Self {
        TemplateField::Exact(val.into())
    }
}

impl From<i32> for TemplateField {
    fn from(val: i32) -> Self {
        TemplateField::Exact(val.into())
    }
}

impl From<String> for TemplateField {
    fn from(val: String) -> Self {
        TemplateField::Exact(val.into())
    }
}

impl From<&str> for TemplateField {
    fn from(val: &str) -> Self {
        TemplateField::Exact(val.into())
    }
}

impl From<bool> for TemplateField {
    fn from(val: bool) -> Self {
        TemplateField::Exact(val.into())
    }
}

impl From<f64> for TemplateField {
    fn from(val: f64) -> Self {
        TemplateField::Exact(val.into())
    }
}
