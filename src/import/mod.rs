//! 矩阵导入导出模块
//!
//! 文本格式：每行一组以空白分隔的数值，空行忽略

use crate::error::{Error, Result};
use crate::metrics;
use crate::types::{format_weight, Matrix, MAX_NODES};
use rand::Rng;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// 解析文本矩阵
///
/// 依次检查：非空、行长一致、方阵、大小上限、每个单元格为有限数值。
pub fn parse_matrix_text(text: &str) -> Result<Matrix> {
    let result = parse_rows(text);
    metrics::global_metrics().record_parse(result.is_ok());
    result
}

fn parse_rows(text: &str) -> Result<Matrix> {
    let rows: Vec<Vec<&str>> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.split_whitespace().collect())
        .collect();

    if rows.is_empty() {
        return Err(Error::EmptyMatrix);
    }

    let cols = rows[0].len();
    if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != cols) {
        return Err(Error::RaggedRow {
            row,
            expected: cols,
            found: r.len(),
        });
    }
    if rows.len() != cols {
        return Err(Error::NotSquare {
            rows: rows.len(),
            cols,
        });
    }
    if rows.len() > MAX_NODES {
        return Err(Error::MatrixTooLarge {
            size: rows.len(),
            max: MAX_NODES,
        });
    }

    let mut matrix = Vec::with_capacity(rows.len());
    for (i, r) in rows.iter().enumerate() {
        let mut parsed = Vec::with_capacity(cols);
        for (j, cell) in r.iter().enumerate() {
            match cell.parse::<f64>() {
                Ok(v) if v.is_finite() => parsed.push(v),
                _ => {
                    return Err(Error::InvalidCell {
                        row: i,
                        col: j,
                        value: cell.to_string(),
                    })
                }
            }
        }
        matrix.push(parsed);
    }

    debug!(n = matrix.len(), "matrix parsed");
    Ok(matrix)
}

/// 从文件读取矩阵
pub fn load_matrix_file<P: AsRef<Path>>(path: P) -> Result<Matrix> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let matrix = parse_matrix_text(&text)?;
    info!(path = %path.display(), n = matrix.len(), "matrix loaded");
    Ok(matrix)
}

/// 导出为文本格式，每行以换行结尾
pub fn export_matrix_text(matrix: &Matrix) -> String {
    let mut out = String::new();
    for row in matrix {
        let cells: Vec<String> = row.iter().map(|&w| format_weight(w)).collect();
        out.push_str(&cells.join(" "));
        out.push('\n');
    }
    out
}

/// 写入矩阵文件
pub fn save_matrix_file<P: AsRef<Path>>(path: P, matrix: &Matrix) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, export_matrix_text(matrix))?;
    info!(path = %path.display(), n = matrix.len(), "matrix saved");
    Ok(())
}

/// 随机矩阵：对角线为 0，其余单元格各有一半概率为 0，否则取 1..=9；
/// 无向时沿对角线镜像
pub fn random_matrix<R: Rng + ?Sized>(n: usize, directed: bool, rng: &mut R) -> Matrix {
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            if i == j || (!directed && j < i) {
                continue;
            }
            let w = if rng.gen_bool(0.5) {
                0.0
            } else {
                rng.gen_range(1..=9) as f64
            };
            matrix[i][j] = w;
            if !directed {
                matrix[j][i] = w;
            }
        }
    }
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_matrix() {
        let m = parse_matrix_text("0 1 0\n\n 1 0 2.5 \r\n0 2.5 0\n").unwrap();
        assert_eq!(
            m,
            vec![
                vec![0.0, 1.0, 0.0],
                vec![1.0, 0.0, 2.5],
                vec![0.0, 2.5, 0.0]
            ]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_matrix_text("  \n\n"), Err(Error::EmptyMatrix)));
        assert!(matches!(
            parse_matrix_text("0 1\n1 0 3\n"),
            Err(Error::RaggedRow {
                row: 1,
                expected: 2,
                found: 3
            })
        ));
        assert!(matches!(
            parse_matrix_text("0 1 2\n1 0 3\n"),
            Err(Error::NotSquare { rows: 2, cols: 3 })
        ));
        match parse_matrix_text("0 x\n1 0\n") {
            Err(Error::InvalidCell { row, col, value }) => {
                assert_eq!((row, col), (0, 1));
                assert_eq!(value, "x");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            parse_matrix_text("0 inf\n1 0\n"),
            Err(Error::InvalidCell { .. })
        ));
    }

    #[test]
    fn test_parse_too_large() {
        let row = vec!["0"; 13].join(" ");
        let text = vec![row; 13].join("\n");
        assert!(matches!(
            parse_matrix_text(&text),
            Err(Error::MatrixTooLarge { size: 13, max: 12 })
        ));
    }

    #[test]
    fn test_file_roundtrip() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "0 4 0").unwrap();
        writeln!(file, "0 0 1.5").unwrap();
        writeln!(file, "2 0 0").unwrap();

        let m = load_matrix_file(file.path()).unwrap();
        assert_eq!(m[1][2], 1.5);
        assert_eq!(export_matrix_text(&m), "0 4 0\n0 0 1.5\n2 0 0\n");

        let out = NamedTempFile::new().unwrap();
        save_matrix_file(out.path(), &m).unwrap();
        assert_eq!(load_matrix_file(out.path()).unwrap(), m);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load_matrix_file("/nonexistent/algotrace/matrix.txt"),
            Err(Error::IoError(_))
        ));
    }

    #[test]
    fn test_random_matrix_shape() {
        let mut rng = StdRng::seed_from_u64(3);
        let m = random_matrix(7, false, &mut rng);
        for i in 0..7 {
            assert_eq!(m[i][i], 0.0);
            for j in 0..7 {
                assert_eq!(m[i][j], m[j][i]);
                assert!(m[i][j] == 0.0 || (1.0..=9.0).contains(&m[i][j]));
                assert_eq!(m[i][j].fract(), 0.0);
            }
        }

        let mut a = StdRng::seed_from_u64(9);
        let mut b = StdRng::seed_from_u64(9);
        assert_eq!(random_matrix(5, true, &mut a), random_matrix(5, true, &mut b));
    }
}
