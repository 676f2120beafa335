//! Overload resolution
//!
//! Pure ranked-candidate selection over a registry entry's overload
//! lists. Candidates share the requested name and arity; every argument
//! position is ranked against the declared parameter type, most to least
//! specific:
//!
//! 1. `Exact` — the parameter type exactly matches the argument's runtime
//!    type (a trailing capability parameter fed a bare callable also
//!    ranks here; the match records the coercion for the caller),
//! 2. `Widen` — the general `Number` parameter over a concrete `Int`
//!    argument,
//! 3. `Top` — the universal `Any`, and `Null` arguments against
//!    reference-shaped parameters.
//!
//! A position matching none of these eliminates the candidate. Candidates
//! compare lexicographically position by position; ties keep the
//! first-declared candidate. No match is data, not an error — the caller
//! routes it into the missing-member protocol.

use std::sync::Arc;

use gild_core::{CapabilityDef, ParamType, Value};

use crate::registry::RegistryEntry;

/// Specificity of one argument position, least to most specific
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rank {
    /// Universal top type
    Top,
    /// Numeric supertype over a concrete integer
    Widen,
    /// Exact runtime-type match
    Exact,
}

/// A successful resolution
#[derive(Debug, Clone)]
pub struct ResolvedCall {
    /// Ordinal of the selected overload in the registry entry
    pub ordinal: usize,
    /// Capability to coerce the trailing bare callable into, if the
    /// selected overload needs it
    pub coerce_trailing: Option<Arc<CapabilityDef>>,
}

/// Outcome of overload resolution
#[derive(Debug, Clone)]
pub enum Resolution {
    /// A single best overload was selected
    Match(ResolvedCall),
    /// No declared overload is compatible with the arguments
    NoMatch,
}

/// Select the best-matching overload of `name` for the given arguments
pub fn resolve(entry: &RegistryEntry, name: &str, args: &[Value]) -> Resolution {
    let Some(ordinals) = entry.method_ordinals(name) else {
        return Resolution::NoMatch;
    };

    let mut best: Option<(Vec<Rank>, ResolvedCall)> = None;
    for &ordinal in ordinals {
        let method = entry.method(ordinal);
        if method.params.len() != args.len() {
            continue;
        }

        let Some((ranks, coerce_trailing)) = rank_candidate(&method.params, args) else {
            continue;
        };

        let better = match &best {
            None => true,
            // Strictly better only, so ties keep the first-declared overload
            Some((best_ranks, _)) => ranks > *best_ranks,
        };
        if better {
            best = Some((
                ranks,
                ResolvedCall {
                    ordinal,
                    coerce_trailing,
                },
            ));
        }
    }

    match best {
        Some((_, resolved)) => Resolution::Match(resolved),
        None => Resolution::NoMatch,
    }
}

/// Rank every position of a candidate, or reject it
fn rank_candidate(
    params: &[ParamType],
    args: &[Value],
) -> Option<(Vec<Rank>, Option<Arc<CapabilityDef>>)> {
    let mut ranks = Vec::with_capacity(args.len());
    let mut coerce_trailing = None;

    for (i, (param, arg)) in params.iter().zip(args.iter()).enumerate() {
        let trailing = i + 1 == params.len();
        match rank_position(param, arg, trailing) {
            Some(Position::Plain(rank)) => ranks.push(rank),
            Some(Position::Coerce(def)) => {
                coerce_trailing = Some(def);
                ranks.push(Rank::Exact);
            }
            None => return None,
        }
    }

    Some((ranks, coerce_trailing))
}

enum Position {
    Plain(Rank),
    Coerce(Arc<CapabilityDef>),
}

fn rank_position(param: &ParamType, arg: &Value, trailing: bool) -> Option<Position> {
    use Position::{Coerce, Plain};

    match (param, arg) {
        (ParamType::Any, _) => Some(Plain(Rank::Top)),

        (ParamType::Bool, Value::Bool(_)) => Some(Plain(Rank::Exact)),
        (ParamType::Int, Value::Int(_)) => Some(Plain(Rank::Exact)),
        (ParamType::Number, Value::Float(_)) => Some(Plain(Rank::Exact)),
        (ParamType::Number, Value::Int(_)) => Some(Plain(Rank::Widen)),
        (ParamType::Str, Value::Str(_)) => Some(Plain(Rank::Exact)),

        (ParamType::Service(want), Value::Service(have)) if want == have.type_name() => {
            Some(Plain(Rank::Exact))
        }

        (ParamType::Capability(want), Value::Capability(have))
            if want.name == have.def().name =>
        {
            Some(Plain(Rank::Exact))
        }
        // A bare callable in the last position bridges via coercion and
        // counts as an exact match for ranking
        (ParamType::Capability(def), Value::Callable(_)) if trailing => {
            Some(Coerce(def.clone()))
        }

        // Null matches reference-shaped parameters at the top tier
        (
            ParamType::Str | ParamType::Service(_) | ParamType::Capability(_),
            Value::Null,
        ) => Some(Plain(Rank::Top)),

        _ => None,
    }
}
