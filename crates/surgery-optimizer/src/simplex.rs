//! 線性鬆弛求解（單純形法，表格形式）
//!
//! 只處理 maximize c·y, A·y ≤ b, y ≥ 0 且 b ≥ 0 的形式：
//! 原點永遠可行，鬆弛變數即為初始基底，因此不需要第一階段。

const EPS: f64 = 1e-9;
const MAX_PIVOTS: usize = 50_000;

/// 線性鬆弛求解結果
#[derive(Debug, Clone, PartialEq)]
pub enum LpOutcome {
    Optimal { values: Vec<f64>, objective: f64 },
    Unbounded,
    /// 超出樞軸次數上限（Bland 規則下不應發生，保留為數值異常的出口）
    PivotLimit,
}

/// 求解 maximize c·y, rows·y ≤ rhs, y ≥ 0
///
/// 進基與出基都採用 Bland 規則（最小索引），保證不循環且結果可重現。
pub fn maximize(objective: &[f64], rows: &[Vec<f64>], rhs: &[f64]) -> LpOutcome {
    let n = objective.len();
    let m = rows.len();
    let width = n + m + 1;
    let rhs_col = width - 1;

    let mut tableau = vec![vec![0.0; width]; m + 1];
    for (i, row) in rows.iter().enumerate() {
        tableau[i][..n].copy_from_slice(row);
        tableau[i][n + i] = 1.0;
        tableau[i][rhs_col] = rhs[i].max(0.0);
    }
    for (j, &c) in objective.iter().enumerate() {
        tableau[m][j] = -c;
    }
    let mut basis: Vec<usize> = (n..n + m).collect();

    for _ in 0..MAX_PIVOTS {
        let Some(col) = (0..n + m).find(|&j| tableau[m][j] < -EPS) else {
            let mut values = vec![0.0; n];
            for (i, &var) in basis.iter().enumerate() {
                if var < n {
                    values[var] = tableau[i][rhs_col];
                }
            }
            return LpOutcome::Optimal {
                values,
                objective: tableau[m][rhs_col],
            };
        };

        let mut pivot_row: Option<usize> = None;
        let mut best_ratio = f64::INFINITY;
        for i in 0..m {
            let a = tableau[i][col];
            if a <= EPS {
                continue;
            }
            let ratio = tableau[i][rhs_col] / a;
            let better = match pivot_row {
                None => true,
                Some(r) => {
                    ratio < best_ratio - EPS
                        || (ratio <= best_ratio + EPS && basis[i] < basis[r])
                }
            };
            if better {
                pivot_row = Some(i);
                best_ratio = ratio;
            }
        }

        let Some(row) = pivot_row else {
            return LpOutcome::Unbounded;
        };
        pivot(&mut tableau, row, col);
        basis[row] = col;
    }

    LpOutcome::PivotLimit
}

fn pivot(tableau: &mut [Vec<f64>], row: usize, col: usize) {
    let pivot_value = tableau[row][col];
    for value in tableau[row].iter_mut() {
        *value /= pivot_value;
    }

    let pivot_row = tableau[row].clone();
    for (r, current) in tableau.iter_mut().enumerate() {
        if r == row {
            continue;
        }
        let factor = current[col];
        if factor.abs() <= f64::EPSILON {
            continue;
        }
        for (value, p) in current.iter_mut().zip(&pivot_row) {
            *value -= factor * p;
        }
    }
}
