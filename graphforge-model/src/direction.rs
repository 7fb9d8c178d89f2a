use std::fmt;
use std::str::FromStr;

/// Which slot of a [`Quad`](crate::Quad) is being addressed.
///
/// Ordinal layout is load-bearing: [`QuadHash`](crate::QuadHash) concatenates
/// direction hashes in this order (subject at offset `0`, predicate at
/// `1 * H`, object at `2 * H`, label at `3 * H`), so the discriminant values
/// double as byte offsets via [`Direction::offset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Subject,
    Predicate,
    Object,
    Label,
    /// Not a quad slot; used by iterators that don't care which direction
    /// they bind (e.g. `All`-style backend scans).
    Any,
}

impl Direction {
    pub const QUAD_DIRECTIONS: [Self; 4] = [Self::Subject, Self::Predicate, Self::Object, Self::Label];

    /// Byte offset of this direction's hash segment within a [`QuadHash`](crate::QuadHash).
    ///
    /// # Panics
    ///
    /// Panics if called on [`Direction::Any`], which has no fixed offset.
    #[must_use]
    pub fn offset(self, hash_width: usize) -> usize {
        match self {
            Self::Subject => 0,
            Self::Predicate => hash_width,
            Self::Object => hash_width * 2,
            Self::Label => hash_width * 3,
            Self::Any => unreachable!("Direction::Any has no fixed QuadHash offset"),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Subject => "subject",
            Self::Predicate => "predicate",
            Self::Object => "object",
            Self::Label => "label",
            Self::Any => "any",
        })
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("'{0}' is not a valid direction")]
pub struct InvalidDirectionError(String);

impl FromStr for Direction {
    type Err = InvalidDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subject" | "s" => Ok(Self::Subject),
            "predicate" | "p" => Ok(Self::Predicate),
            "object" | "o" => Ok(Self::Object),
            "label" | "g" => Ok(Self::Label),
            "any" => Ok(Self::Any),
            _ => Err(InvalidDirectionError(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_in_ordinal_order() {
        assert_eq!(Direction::Subject.offset(20), 0);
        assert_eq!(Direction::Predicate.offset(20), 20);
        assert_eq!(Direction::Object.offset(20), 40);
        assert_eq!(Direction::Label.offset(20), 60);
    }

    #[test]
    fn round_trips_through_str() {
        for d in Direction::QUAD_DIRECTIONS {
            assert_eq!(d.to_string().parse::<Direction>().unwrap(), d);
        }
    }
}
