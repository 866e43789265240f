//! Scalar fields: a value and a gradient at every point of the plane.
//!
//! A [`ScalarField`] is immutable after construction and stateless to
//! evaluate, so one instance can be shared by the descent agent and the
//! surface renderer without locking.
//!
//! Distance-based fields are undefined exactly at their centres: the gradient
//! divides by the distance, which is zero there, and the resulting NaN is
//! returned as-is.

use glam::DVec2;
use serde_json::{json, Value};

use crate::error::SimError;
use crate::params::{param_f64, param_point};

/// All registered field names, in listing order.
const FIELD_NAMES: &[&str] = &["distance", "two-center", "elliptic-bowl"];

const DEFAULT_CENTER: DVec2 = DVec2::new(200.0, 200.0);
const DEFAULT_FIRST_CENTER: DVec2 = DVec2::new(100.0, 100.0);
const DEFAULT_SECOND_CENTER: DVec2 = DVec2::new(300.0, 300.0);
/// Weight of the first centre in [`TwoCenterWeightedDistance`].
const DEFAULT_WEIGHT_A: f64 = 2.0;
/// Weight of the second centre in [`TwoCenterWeightedDistance`].
const DEFAULT_WEIGHT_B: f64 = 1.0;
/// Horizontal coefficient of [`EllipticBowl`].
const DEFAULT_BOWL_A: f64 = 1.0;
/// Vertical coefficient of [`EllipticBowl`].
const DEFAULT_BOWL_B: f64 = 4.0;

/// A scalar function of the plane together with its gradient.
///
/// Implementations must be deterministic and free of side effects.
/// `Send + Sync` so a field can be shared across the scheduler's tasks.
pub trait ScalarField: Send + Sync {
    /// Field value at `(x, y)`.
    fn forward(&self, x: f64, y: f64) -> f64;

    /// Gradient vector at `(x, y)`.
    fn backward(&self, x: f64, y: f64) -> DVec2;
}

/// Euclidean distance to a single centre.
///
/// `backward` is the unit vector pointing from the centre to the sample
/// point. At the centre itself it is `0 / 0 = NaN` in both components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SingleCenterDistance {
    pub center: DVec2,
}

impl SingleCenterDistance {
    pub fn new(cx: f64, cy: f64) -> Self {
        Self {
            center: DVec2::new(cx, cy),
        }
    }
}

impl ScalarField for SingleCenterDistance {
    fn forward(&self, x: f64, y: f64) -> f64 {
        self.center.distance(DVec2::new(x, y))
    }

    fn backward(&self, x: f64, y: f64) -> DVec2 {
        unit_from(self.center, DVec2::new(x, y))
    }
}

/// Weighted sum of the distances to two centres: `wA·d₁ + wB·d₂`.
///
/// Singular at either centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoCenterWeightedDistance {
    pub first: DVec2,
    pub second: DVec2,
    pub weight_a: f64,
    pub weight_b: f64,
}

impl TwoCenterWeightedDistance {
    /// Creates the field with the default weights (2 for the first centre, 1 for the second).
    pub fn new(cx1: f64, cy1: f64, cx2: f64, cy2: f64) -> Self {
        Self {
            first: DVec2::new(cx1, cy1),
            second: DVec2::new(cx2, cy2),
            weight_a: DEFAULT_WEIGHT_A,
            weight_b: DEFAULT_WEIGHT_B,
        }
    }

    pub fn with_weights(mut self, weight_a: f64, weight_b: f64) -> Self {
        self.weight_a = weight_a;
        self.weight_b = weight_b;
        self
    }
}

impl ScalarField for TwoCenterWeightedDistance {
    fn forward(&self, x: f64, y: f64) -> f64 {
        let p = DVec2::new(x, y);
        self.first.distance(p) * self.weight_a + self.second.distance(p) * self.weight_b
    }

    fn backward(&self, x: f64, y: f64) -> DVec2 {
        let p = DVec2::new(x, y);
        unit_from(self.first, p) * self.weight_a + unit_from(self.second, p) * self.weight_b
    }
}

/// Axis-aligned quadratic bowl: `a·dx² + b·dy²`.
///
/// `backward` returns `(2·dx / a, 2·dy / b)`. This is NOT the analytic
/// gradient of `forward` (that would be `(2·a·dx, 2·b·dy)`); the two agree
/// only when a coefficient is 1. The observed trajectories depend on this
/// relationship, so it is kept as is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipticBowl {
    pub center: DVec2,
    pub a: f64,
    pub b: f64,
}

impl EllipticBowl {
    /// Creates the bowl with the default coefficients `a = 1`, `b = 4`.
    pub fn new(cx: f64, cy: f64) -> Self {
        Self {
            center: DVec2::new(cx, cy),
            a: DEFAULT_BOWL_A,
            b: DEFAULT_BOWL_B,
        }
    }

    pub fn with_coefficients(mut self, a: f64, b: f64) -> Self {
        self.a = a;
        self.b = b;
        self
    }
}

impl ScalarField for EllipticBowl {
    fn forward(&self, x: f64, y: f64) -> f64 {
        let d = self.center - DVec2::new(x, y);
        self.a * d.x * d.x + self.b * d.y * d.y
    }

    fn backward(&self, x: f64, y: f64) -> DVec2 {
        let d = DVec2::new(x, y) - self.center;
        DVec2::new(2.0 * d.x / self.a, 2.0 * d.y / self.b)
    }
}

/// `(p - center) / |p - center|`, unguarded.
fn unit_from(center: DVec2, p: DVec2) -> DVec2 {
    let diff = p - center;
    diff / diff.length()
}

/// Closed set of the built-in fields, constructible by name.
///
/// Use [`FieldKind::from_name`] for string-based construction (CLI, config files).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// Distance to one centre.
    Distance(SingleCenterDistance),
    /// Weighted distance to two centres.
    TwoCenter(TwoCenterWeightedDistance),
    /// Quadratic bowl.
    EllipticBowl(EllipticBowl),
}

impl FieldKind {
    /// Constructs a field by registry name, reading its constants from `params`.
    ///
    /// Missing constants take their defaults. Returns `SimError::UnknownField`
    /// if the name is not recognized.
    pub fn from_name(name: &str, params: &Value) -> Result<Self, SimError> {
        match name {
            "distance" => {
                let c = param_point(params, "cx", "cy", DEFAULT_CENTER);
                Ok(FieldKind::Distance(SingleCenterDistance::new(c.x, c.y)))
            }
            "two-center" => {
                let c1 = param_point(params, "cx1", "cy1", DEFAULT_FIRST_CENTER);
                let c2 = param_point(params, "cx2", "cy2", DEFAULT_SECOND_CENTER);
                let field = TwoCenterWeightedDistance::new(c1.x, c1.y, c2.x, c2.y).with_weights(
                    param_f64(params, "weight_a", DEFAULT_WEIGHT_A),
                    param_f64(params, "weight_b", DEFAULT_WEIGHT_B),
                );
                Ok(FieldKind::TwoCenter(field))
            }
            "elliptic-bowl" => {
                let c = param_point(params, "cx", "cy", DEFAULT_CENTER);
                let field = EllipticBowl::new(c.x, c.y).with_coefficients(
                    param_f64(params, "a", DEFAULT_BOWL_A),
                    param_f64(params, "b", DEFAULT_BOWL_B),
                );
                Ok(FieldKind::EllipticBowl(field))
            }
            _ => Err(SimError::UnknownField(name.to_string())),
        }
    }

    /// Returns a slice of all recognized field names.
    pub fn list_fields() -> &'static [&'static str] {
        FIELD_NAMES
    }

    /// Registry name of this field.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Distance(_) => "distance",
            FieldKind::TwoCenter(_) => "two-center",
            FieldKind::EllipticBowl(_) => "elliptic-bowl",
        }
    }

    /// Current constants as a JSON object, in the shape `from_name` accepts.
    pub fn params(&self) -> Value {
        match self {
            FieldKind::Distance(f) => json!({"cx": f.center.x, "cy": f.center.y}),
            FieldKind::TwoCenter(f) => json!({
                "cx1": f.first.x,
                "cy1": f.first.y,
                "cx2": f.second.x,
                "cy2": f.second.y,
                "weight_a": f.weight_a,
                "weight_b": f.weight_b,
            }),
            FieldKind::EllipticBowl(f) => json!({
                "cx": f.center.x,
                "cy": f.center.y,
                "a": f.a,
                "b": f.b,
            }),
        }
    }

    /// Schema describing the constants of the named field.
    ///
    /// Returns `SimError::UnknownField` if the name is not recognized.
    pub fn param_schema(name: &str) -> Result<Value, SimError> {
        let coord = |default: f64, description: &str| {
            json!({"type": "number", "default": default, "description": description})
        };
        match name {
            "distance" => Ok(json!({
                "cx": coord(DEFAULT_CENTER.x, "Centre x coordinate"),
                "cy": coord(DEFAULT_CENTER.y, "Centre y coordinate"),
            })),
            "two-center" => Ok(json!({
                "cx1": coord(DEFAULT_FIRST_CENTER.x, "First centre x coordinate"),
                "cy1": coord(DEFAULT_FIRST_CENTER.y, "First centre y coordinate"),
                "cx2": coord(DEFAULT_SECOND_CENTER.x, "Second centre x coordinate"),
                "cy2": coord(DEFAULT_SECOND_CENTER.y, "Second centre y coordinate"),
                "weight_a": coord(DEFAULT_WEIGHT_A, "Weight of the first distance"),
                "weight_b": coord(DEFAULT_WEIGHT_B, "Weight of the second distance"),
            })),
            "elliptic-bowl" => Ok(json!({
                "cx": coord(DEFAULT_CENTER.x, "Centre x coordinate"),
                "cy": coord(DEFAULT_CENTER.y, "Centre y coordinate"),
                "a": coord(DEFAULT_BOWL_A, "Horizontal coefficient"),
                "b": coord(DEFAULT_BOWL_B, "Vertical coefficient"),
            })),
            _ => Err(SimError::UnknownField(name.to_string())),
        }
    }
}

impl ScalarField for FieldKind {
    fn forward(&self, x: f64, y: f64) -> f64 {
        match self {
            FieldKind::Distance(f) => f.forward(x, y),
            FieldKind::TwoCenter(f) => f.forward(x, y),
            FieldKind::EllipticBowl(f) => f.forward(x, y),
        }
    }

    fn backward(&self, x: f64, y: f64) -> DVec2 {
        match self {
            FieldKind::Distance(f) => f.backward(x, y),
            FieldKind::TwoCenter(f) => f.backward(x, y),
            FieldKind::EllipticBowl(f) => f.backward(x, y),
        }
    }
}
