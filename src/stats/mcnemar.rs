// McNemar test of marginal homogeneity over a matched-pairs 2x2 table.
//
// Only the discordant cells (b, c) carry information about marginal
// change. Below 25 discordant pairs the exact binomial null is used;
// above, the chi-square approximation with continuity correction. With
// no discordant pairs at all the test is a no-op: statistic 0, p = 1.0,
// odds ratio 1.0.

use super::distributions::{binomial_half_cdf, chi_square_sf};

/// 2x2 matrix of matched binary outcome counts.
///
/// Cell layout (condition A rows, condition B columns):
/// a = both correct, b = A correct / B wrong, c = A wrong / B correct,
/// d = both wrong.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContingencyTable {
    pub a: u64,
    pub b: u64,
    pub c: u64,
    pub d: u64,
}

impl ContingencyTable {
    /// Build the table from label-matched (condition A, condition B)
    /// outcome pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (bool, bool)>) -> Self {
        let mut table = Self::default();
        for (on_a, on_b) in pairs {
            match (on_a, on_b) {
                (true, true) => table.a += 1,
                (true, false) => table.b += 1,
                (false, true) => table.c += 1,
                (false, false) => table.d += 1,
            }
        }
        table
    }

    /// Total matched labels: the cell sum invariant.
    pub fn n_matched(&self) -> u64 {
        self.a + self.b + self.c + self.d
    }

    /// Discordant-pair total b + c.
    pub fn discordant(&self) -> u64 {
        self.b + self.c
    }

    /// Row-major cells for the report artifact.
    pub fn cells(&self) -> [[u64; 2]; 2] {
        [[self.a, self.b], [self.c, self.d]]
    }

    /// Odds ratio of the discordant cells: b/c, +inf when c = 0 and
    /// b > 0, and 1.0 when both discordant cells are zero.
    pub fn discordant_odds_ratio(&self) -> f64 {
        if self.c > 0 {
            self.b as f64 / self.c as f64
        } else if self.b > 0 {
            f64::INFINITY
        } else {
            1.0
        }
    }
}

/// Outcome of a McNemar test.
#[derive(Debug, Clone, Copy)]
pub struct McnemarOutcome {
    /// min(b, c) for the exact variant, the corrected chi-square
    /// statistic otherwise.
    pub statistic: f64,

    /// Two-sided p-value.
    pub p_value: f64,

    /// Whether the exact binomial variant was used.
    pub exact: bool,
}

/// Discordant total below which the exact binomial variant is used.
const EXACT_THRESHOLD: u64 = 25;

/// McNemar test of marginal homogeneity on a matched-pairs table.
pub fn mcnemar(table: &ContingencyTable) -> McnemarOutcome {
    let b = table.b;
    let c = table.c;
    let n = b + c;

    if n == 0 {
        return McnemarOutcome {
            statistic: 0.0,
            p_value: 1.0,
            exact: true,
        };
    }

    if n < EXACT_THRESHOLD {
        let k = b.min(c);
        let p = (2.0 * binomial_half_cdf(k, n)).min(1.0);
        McnemarOutcome {
            statistic: k as f64,
            p_value: p,
            exact: true,
        }
    } else {
        let diff = (b as f64 - c as f64).abs();
        let corrected = (diff - 1.0).max(0.0);
        let statistic = corrected * corrected / n as f64;
        McnemarOutcome {
            statistic,
            p_value: chi_square_sf(statistic, 1.0),
            exact: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_from_pairs() {
        let table = ContingencyTable::from_pairs([
            (true, true),
            (true, true),
            (true, false),
            (false, true),
            (false, false),
        ]);
        assert_eq!(table, ContingencyTable { a: 2, b: 1, c: 1, d: 1 });
        assert_eq!(table.n_matched(), 5);
        assert_eq!(table.discordant(), 2);
        assert_eq!(table.cells(), [[2, 1], [1, 1]]);
    }

    #[test]
    fn test_no_discordant_pairs_is_neutral() {
        let table = ContingencyTable { a: 30, b: 0, c: 0, d: 10 };
        let out = mcnemar(&table);
        assert_eq!(out.statistic, 0.0);
        assert_eq!(out.p_value, 1.0);
        assert_eq!(table.discordant_odds_ratio(), 1.0);
    }

    #[test]
    fn test_exact_branch_small_discordant() {
        // b = 1, c = 9: exact p = 2 * P(X <= 1 | Bin(10, 1/2)) = 22/1024
        let table = ContingencyTable { a: 20, b: 1, c: 9, d: 15 };
        let out = mcnemar(&table);
        assert!(out.exact);
        assert_eq!(out.statistic, 1.0);
        assert!((out.p_value - 22.0 / 1024.0).abs() < 1e-12);
    }

    #[test]
    fn test_chi_square_branch_large_discordant() {
        // b = 30, c = 5: corrected chi2 = (25 - 1)^2 / 35
        let table = ContingencyTable { a: 10, b: 30, c: 5, d: 10 };
        let out = mcnemar(&table);
        assert!(!out.exact);
        let expected = 24.0 * 24.0 / 35.0;
        assert!((out.statistic - expected).abs() < 1e-12);
        assert!(out.p_value < 0.001);
    }

    #[test]
    fn test_balanced_discordant_not_significant() {
        let table = ContingencyTable { a: 10, b: 20, c: 20, d: 10 };
        let out = mcnemar(&table);
        assert!(out.p_value > 0.8);
    }

    #[test]
    fn test_odds_ratio_conventions() {
        assert_eq!(
            ContingencyTable { a: 0, b: 4, c: 2, d: 0 }.discordant_odds_ratio(),
            2.0
        );
        assert!(ContingencyTable { a: 0, b: 4, c: 0, d: 0 }
            .discordant_odds_ratio()
            .is_infinite());
        assert_eq!(
            ContingencyTable { a: 5, b: 0, c: 0, d: 5 }.discordant_odds_ratio(),
            1.0
        );
    }

    #[test]
    fn test_role_swap_inverts_odds_ratio_keeps_p() {
        let ab = ContingencyTable { a: 12, b: 9, c: 3, d: 6 };
        let ba = ContingencyTable { a: 12, b: 3, c: 9, d: 6 };
        let out_ab = mcnemar(&ab);
        let out_ba = mcnemar(&ba);
        assert!((out_ab.p_value - out_ba.p_value).abs() < 1e-12);
        let or_ab = ab.discordant_odds_ratio();
        let or_ba = ba.discordant_odds_ratio();
        assert!((or_ab - 1.0 / or_ba).abs() < 1e-12);
    }
}
