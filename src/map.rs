use crate::error::ParseError;
use crate::reader::{parse_exact, parse_fields, LineReader};
use log::*;
use nalgebra::{DMatrix, Point2};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridDimensions {
    pub width: usize,
    pub height: usize,
}

impl fmt::Display for GridDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Traversal costs addressed as `[(y, x)]`: one row per y, one column per x.
#[derive(Clone, Debug, PartialEq)]
pub struct CostMap {
    cells: DMatrix<f64>,
}

impl CostMap {
    /// `columns[x][y]` is the cost of cell (x, y), the layout of the problem file.
    fn from_columns(columns: &[Vec<f64>], height: usize) -> Self {
        let flat: Vec<f64> = columns.iter().flatten().copied().collect();
        let cells = DMatrix::from_row_slice(columns.len(), height, &flat).transpose();
        CostMap { cells }
    }

    pub fn width(&self) -> usize {
        self.cells.ncols()
    }

    pub fn height(&self) -> usize {
        self.cells.nrows()
    }

    pub fn cost(&self, x: usize, y: usize) -> Option<f64> {
        self.cells.get((y, x)).copied()
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.cells
    }

    /// Smallest and largest cost, used to normalize colors.
    pub fn range(&self) -> (f64, f64) {
        self.cells
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &c| {
                (lo.min(c), hi.max(c))
            })
    }
}

/// Everything a problem file describes.
#[derive(Clone, Debug, PartialEq)]
pub struct Problem {
    pub dimensions: GridDimensions,
    /// Cells at or above this cost are impassable.
    pub collision_threshold: i64,
    pub robot_start: Point2<i64>,
    /// Target position per time step.
    pub target_trajectory: Vec<Point2<f64>>,
    pub costmap: CostMap,
}

impl Problem {
    pub fn is_uncrossable(&self, cost: f64) -> bool {
        cost >= self.collision_threshold as f64
    }
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<Problem, ParseError> {
    let path = path.as_ref();
    info!("Reading problem definition from: {}", path.display());
    parse(BufReader::new(File::open(path)?))
}

/// Reads the `N`, `C`, `R`, `T` ... `M` sections followed by the cost matrix.
pub fn parse<R: BufRead>(reader: R) -> Result<Problem, ParseError> {
    let mut lines = LineReader::new(reader);

    lines.expect_marker("N")?;
    let size = lines.require("map size")?;
    let size: Vec<i64> = parse_exact(&size, lines.line(), 2, "integer")?;
    let (width, height) = (size[0], size[1]);
    if width <= 0 || height <= 0 {
        return Err(ParseError::InvalidDimensions { width, height });
    }
    let dimensions = GridDimensions {
        width: width as usize,
        height: height as usize,
    };
    info!("map size: {}", dimensions);

    lines.expect_marker("C")?;
    let threshold = lines.require("collision threshold")?;
    let collision_threshold = parse_exact::<i64>(&threshold, lines.line(), 1, "integer")?[0];
    info!("collision threshold: {}", collision_threshold);

    lines.expect_marker("R")?;
    let pose = lines.require("robot pose")?;
    let pose: Vec<i64> = parse_exact(&pose, lines.line(), 2, "integer")?;
    let robot_start = Point2::new(pose[0], pose[1]);
    info!("robot pose: {},{}", robot_start.x, robot_start.y);

    lines.expect_marker("T")?;
    let mut target_trajectory = Vec::new();
    loop {
        let line = lines.require("target position or 'M'")?;
        if line == "M" {
            break;
        }
        let p: Vec<f64> = parse_exact(&line, lines.line(), 2, "number")?;
        target_trajectory.push(Point2::new(p[0], p[1]));
    }
    info!("target_steps: {}", target_trajectory.len());

    let mut columns = Vec::with_capacity(dimensions.width);
    while let Some(line) = lines.next_line()? {
        columns.push(parse_fields::<f64>(&line, lines.line(), "number")?);
    }
    let widest = columns.iter().map(Vec::len).max().unwrap_or(0);
    if columns.len() != dimensions.width
        || columns.iter().any(|c| c.len() != dimensions.height)
    {
        return Err(ParseError::ShapeMismatch {
            width: dimensions.width,
            height: dimensions.height,
            rows: columns.len(),
            columns: widest,
        });
    }
    let costmap = CostMap::from_columns(&columns, dimensions.height);
    debug!(
        "cost matrix {:?}, range {:?}",
        costmap.matrix().shape(),
        costmap.range()
    );

    Ok(Problem {
        dimensions,
        collision_threshold,
        robot_start,
        target_trajectory,
        costmap,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::distributions::{Distribution, Uniform};
    use std::io::Cursor;

    const SMALL: &str = "N\n3,2\nC\n100\nR\n1,2\nT\n1,1\n2.5,1\n3,2\nM\n0,1\n2,3\n4,150\n";

    fn parse_str(text: &str) -> Result<Problem, ParseError> {
        parse(Cursor::new(text.to_owned()))
    }

    #[test]
    fn parses_all_sections() {
        let problem = parse_str(SMALL).unwrap();
        assert_eq!(
            problem.dimensions,
            GridDimensions {
                width: 3,
                height: 2
            }
        );
        assert_eq!(problem.collision_threshold, 100);
        assert_eq!(problem.robot_start, Point2::new(1, 2));
        assert_eq!(
            problem.target_trajectory,
            vec![
                Point2::new(1.0, 1.0),
                Point2::new(2.5, 1.0),
                Point2::new(3.0, 2.0)
            ]
        );
    }

    #[test]
    fn matrix_is_transposed() {
        let costmap = parse_str(SMALL).unwrap().costmap;
        assert_eq!(costmap.height(), 2);
        assert_eq!(costmap.width(), 3);
        assert_eq!(costmap.matrix().shape(), (2, 3));
        // File line x holds the column for x.
        assert_eq!(costmap.cost(0, 0), Some(0.0));
        assert_eq!(costmap.cost(0, 1), Some(1.0));
        assert_eq!(costmap.cost(1, 0), Some(2.0));
        assert_eq!(costmap.cost(2, 1), Some(150.0));
        assert_eq!(costmap.cost(3, 0), None);
        assert_eq!(costmap.range(), (0.0, 150.0));
    }

    #[test]
    fn collision_threshold_is_inclusive() {
        let problem = parse_str(SMALL).unwrap();
        assert!(problem.is_uncrossable(100.0));
        assert!(problem.is_uncrossable(150.0));
        assert!(!problem.is_uncrossable(99.9));
    }

    #[test]
    fn empty_target_trajectory() {
        let problem = parse_str("N\n1,1\nC\n5\nR\n1,1\nT\nM\n7\n").unwrap();
        assert!(problem.target_trajectory.is_empty());
        assert_eq!(problem.costmap.cost(0, 0), Some(7.0));
    }

    #[test]
    fn wrong_marker_fails() {
        let err = parse_str("N\n3,2\nX\n100\n").unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnexpectedMarker {
                line: 3,
                expected: "C",
                ..
            }
        ));
    }

    #[test]
    fn missing_terminator_fails() {
        // Matrix rows are three wide, so they cannot pass as target points.
        let err = parse_str("N\n2,3\nC\n100\nR\n1,1\nT\n1,1\n0,1,2\n3,4,5\n").unwrap_err();
        assert!(matches!(err, ParseError::FieldCount { line: 9, .. }));

        let err = parse_str("N\n2,3\nC\n100\nR\n1,1\nT\n1,1\n").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { line: 9, .. }));
    }

    #[test]
    fn non_numeric_matrix_token_fails() {
        let err = parse_str("N\n2,2\nC\n1\nR\n1,1\nT\nM\n0,1\n2,oops\n").unwrap_err();
        match err {
            ParseError::Number { line, token, .. } => {
                assert_eq!(line, 10);
                assert_eq!(token, "oops");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = std::env::temp_dir().join("costmap_replay_no_such_map.txt");
        assert!(matches!(load(&path), Err(ParseError::Io(_))));
    }

    #[test]
    fn trailing_blank_line_fails() {
        let err = parse_str("N\n1,1\nC\n1\nR\n1,1\nT\nM\n0\n\n").unwrap_err();
        assert!(matches!(err, ParseError::Number { line: 10, .. }));
    }

    #[test]
    fn matrix_shape_must_match_dimensions() {
        let err = parse_str("N\n2,2\nC\n1\nR\n1,1\nT\nM\n0,1\n").unwrap_err();
        assert!(matches!(err, ParseError::ShapeMismatch { rows: 1, .. }));

        let err = parse_str("N\n2,2\nC\n1\nR\n1,1\nT\nM\n0,1\n2,3,4\n").unwrap_err();
        assert!(matches!(err, ParseError::ShapeMismatch { columns: 3, .. }));
    }

    #[test]
    fn non_positive_dimensions_fail() {
        let err = parse_str("N\n0,4\nC\n1\n").unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidDimensions {
                width: 0,
                height: 4
            }
        ));
    }

    fn random_problem_text(rng: &mut rand_pcg::Pcg64) -> (String, usize, usize, usize) {
        let sizes = Uniform::from(1..12usize);
        let costs = Uniform::from(0..255u32);
        let (width, height, steps) = (
            sizes.sample(rng),
            sizes.sample(rng),
            sizes.sample(rng) - 1,
        );
        let mut text = format!("N\n{},{}\nC\n200\nR\n1,1\nT\n", width, height);
        for t in 0..steps {
            text += &format!("{},{}.5\n", t % width + 1, t % height);
        }
        text += "M\n";
        for _ in 0..width {
            let row: Vec<String> = (0..height)
                .map(|_| costs.sample(rng).to_string())
                .collect();
            text += &row.join(",");
            text += "\n";
        }
        (text, width, height, steps)
    }

    #[test]
    fn random_maps_parse_consistently() {
        let mut rng = rand_pcg::Pcg64::new(0, 0);
        for _ in 0..50 {
            let (text, width, height, steps) = random_problem_text(&mut rng);
            let first = parse_str(&text).unwrap();
            assert_eq!(first.dimensions, GridDimensions { width, height });
            assert_eq!(first.costmap.matrix().shape(), (height, width));
            assert_eq!(first.target_trajectory.len(), steps);
            assert_eq!(parse_str(&text).unwrap(), first);
        }
    }
}
