//! Source selection by grid position.

use std::fmt;
use std::str::FromStr;

/// Rule that decides which source image colors a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlternationPattern {
    /// Alternate along both axes
    #[default]
    Checkerboard,
    /// Alternate per row
    Rows,
    /// Alternate per column
    Cols,
    /// Deterministic hash of the cell coordinate
    PseudoRandom,
}

impl FromStr for AlternationPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "checkerboard" | "checker" => Ok(Self::Checkerboard),
            "rows" | "row" => Ok(Self::Rows),
            "cols" | "columns" | "col" => Ok(Self::Cols),
            "random" | "pseudo-random" | "pseudorandom" => Ok(Self::PseudoRandom),
            _ => Err(format!(
                "unknown pattern '{}' (expected checkerboard, rows, cols or random)",
                s
            )),
        }
    }
}

impl fmt::Display for AlternationPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Checkerboard => "checkerboard",
            Self::Rows => "rows",
            Self::Cols => "cols",
            Self::PseudoRandom => "random",
        };
        f.write_str(name)
    }
}

/// Index of the source that colors cell `(col, row)`, in `[0, source_count)`.
///
/// A `source_count` of 0 or 1 always selects source 0.
pub fn pick(col: i64, row: i64, pattern: AlternationPattern, source_count: usize) -> usize {
    if source_count <= 1 {
        return 0;
    }
    let m = source_count as i64;
    let index = match pattern {
        AlternationPattern::Checkerboard => col.wrapping_add(row).rem_euclid(m),
        AlternationPattern::Rows => row.rem_euclid(m),
        AlternationPattern::Cols => col.rem_euclid(m),
        AlternationPattern::PseudoRandom => {
            let h = (col as f64 * 12.9898 + row as f64 * 78.233).sin().abs() * 43758.5453;
            (h.floor() as i64).rem_euclid(m)
        }
    };
    index as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [AlternationPattern; 4] = [
        AlternationPattern::Checkerboard,
        AlternationPattern::Rows,
        AlternationPattern::Cols,
        AlternationPattern::PseudoRandom,
    ];

    #[test]
    fn test_checkerboard() {
        assert_eq!(pick(2, 5, AlternationPattern::Checkerboard, 3), 1);
        assert_eq!(pick(0, 0, AlternationPattern::Checkerboard, 2), 0);
        assert_eq!(pick(1, 0, AlternationPattern::Checkerboard, 2), 1);
    }

    #[test]
    fn test_rows_ignores_col() {
        for col in -10..10 {
            assert_eq!(pick(col, 4, AlternationPattern::Rows, 3), 1);
        }
    }

    #[test]
    fn test_cols_ignores_row() {
        for row in -10..10 {
            assert_eq!(pick(5, row, AlternationPattern::Cols, 3), 2);
        }
    }

    #[test]
    fn test_single_source_always_zero() {
        for pattern in ALL {
            for col in -3..3 {
                for row in -3..3 {
                    assert_eq!(pick(col, row, pattern, 1), 0);
                }
            }
        }
    }

    #[test]
    fn test_negative_coordinates_stay_in_range() {
        assert_eq!(pick(-1, 0, AlternationPattern::Checkerboard, 2), 1);
        assert_eq!(pick(0, -4, AlternationPattern::Rows, 3), 2);
        for pattern in ALL {
            for col in -20..20 {
                for row in -20..20 {
                    assert!(pick(col, row, pattern, 4) < 4);
                }
            }
        }
    }

    #[test]
    fn test_pseudo_random_is_reproducible() {
        let a: Vec<usize> = (0..50)
            .map(|i| pick(i, i * 3, AlternationPattern::PseudoRandom, 5))
            .collect();
        let b: Vec<usize> = (0..50)
            .map(|i| pick(i, i * 3, AlternationPattern::PseudoRandom, 5))
            .collect();
        assert_eq!(a, b);
        // Not constant
        assert!(a.iter().any(|&v| v != a[0]));
    }

    #[test]
    fn test_parse_round_trip() {
        for pattern in ALL {
            assert_eq!(pattern.to_string().parse::<AlternationPattern>(), Ok(pattern));
        }
        assert!("diagonal".parse::<AlternationPattern>().is_err());
    }
}
