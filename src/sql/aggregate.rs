//! # Aggregators
//!
//! One accumulator per aggregate call per group. NULL inputs are skipped by
//! every aggregator.
//!
//! | Kind | Result | Empty input |
//! |------|--------|-------------|
//! | COUNT | INT | 0 |
//! | SUM | `Value::add` of the inputs | NULL |
//! | AVG | FLOAT sum / count | NULL |
//! | MAX / MIN | an input value | NULL |

use crate::types::Value;
use eyre::Result;
use std::cmp::Ordering;
use std::fmt;

pub trait Aggregator {
    fn accumulate(&mut self, value: &Value<'_>) -> Result<()>;

    fn evaluate(&self) -> Value<'static>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    Count,
    Sum,
    Avg,
    Max,
    Min,
}

impl AggregateKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "COUNT" => Some(AggregateKind::Count),
            "SUM" => Some(AggregateKind::Sum),
            "AVG" => Some(AggregateKind::Avg),
            "MAX" => Some(AggregateKind::Max),
            "MIN" => Some(AggregateKind::Min),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AggregateKind::Count => "COUNT",
            AggregateKind::Sum => "SUM",
            AggregateKind::Avg => "AVG",
            AggregateKind::Max => "MAX",
            AggregateKind::Min => "MIN",
        }
    }

    pub fn create_aggregator(&self) -> Box<dyn Aggregator> {
        match self {
            AggregateKind::Count => Box::<CountAggregator>::default(),
            AggregateKind::Sum => Box::<SumAggregator>::default(),
            AggregateKind::Avg => Box::<AvgAggregator>::default(),
            AggregateKind::Max => Box::<MaxAggregator>::default(),
            AggregateKind::Min => Box::<MinAggregator>::default(),
        }
    }
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Default)]
pub struct CountAggregator {
    count: i32,
}

impl Aggregator for CountAggregator {
    fn accumulate(&mut self, value: &Value<'_>) -> Result<()> {
        if !value.is_null() {
            self.count += 1;
        }
        Ok(())
    }

    fn evaluate(&self) -> Value<'static> {
        Value::Int(self.count)
    }
}

#[derive(Debug, Default)]
pub struct SumAggregator {
    sum: Option<Value<'static>>,
}

impl Aggregator for SumAggregator {
    fn accumulate(&mut self, value: &Value<'_>) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }
        self.sum = Some(match self.sum.take() {
            None => value.to_owned_value(),
            Some(sum) => sum.add(value)?,
        });
        Ok(())
    }

    fn evaluate(&self) -> Value<'static> {
        self.sum.clone().unwrap_or(Value::Null)
    }
}

#[derive(Debug, Default)]
pub struct AvgAggregator {
    sum: f64,
    count: usize,
}

impl Aggregator for AvgAggregator {
    fn accumulate(&mut self, value: &Value<'_>) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }
        self.sum += f64::from(value.get_float());
        self.count += 1;
        Ok(())
    }

    fn evaluate(&self) -> Value<'static> {
        if self.count == 0 {
            return Value::Null;
        }
        Value::Float((self.sum / self.count as f64) as f32)
    }
}

#[derive(Debug, Default)]
pub struct MaxAggregator {
    current: Option<Value<'static>>,
}

impl Aggregator for MaxAggregator {
    fn accumulate(&mut self, value: &Value<'_>) -> Result<()> {
        keep_extreme(&mut self.current, value, Ordering::Greater)
    }

    fn evaluate(&self) -> Value<'static> {
        self.current.clone().unwrap_or(Value::Null)
    }
}

#[derive(Debug, Default)]
pub struct MinAggregator {
    current: Option<Value<'static>>,
}

impl Aggregator for MinAggregator {
    fn accumulate(&mut self, value: &Value<'_>) -> Result<()> {
        keep_extreme(&mut self.current, value, Ordering::Less)
    }

    fn evaluate(&self) -> Value<'static> {
        self.current.clone().unwrap_or(Value::Null)
    }
}

/// Replaces `current` when `value` orders as `keep` against it.
fn keep_extreme(current: &mut Option<Value<'static>>, value: &Value<'_>, keep: Ordering) -> Result<()> {
    if value.is_null() {
        return Ok(());
    }
    let replace = match current {
        None => true,
        Some(current) => value.compare(current)? == keep,
    };
    if replace {
        *current = Some(value.to_owned_value());
    }
    Ok(())
}
