use crate::error::ParseError;
use crate::reader::{parse_exact, LineReader};
use log::*;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// One line of the robot log: where the robot was at timestep `t`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RobotState {
    pub t: i64,
    pub x: i64,
    pub y: i64,
}

impl fmt::Display for RobotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[t: {}, x: {}, y: {}]", self.t, self.x, self.y)
    }
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<RobotState>, ParseError> {
    let path = path.as_ref();
    info!("Reading robot trajectory from: {}", path.display());
    parse(BufReader::new(File::open(path)?))
}

pub fn parse<R: BufRead>(reader: R) -> Result<Vec<RobotState>, ParseError> {
    let mut lines = LineReader::new(reader);
    let mut out = Vec::new();
    while let Some(line) = lines.next_line()? {
        let fields: Vec<i64> = parse_exact(&line, lines.line(), 3, "integer")?;
        let state = RobotState {
            t: fields[0],
            x: fields[1],
            y: fields[2],
        };
        debug!("Robot state: {}", state);
        out.push(state);
    }
    info!("robot trajectory: {} records", out.len());
    Ok(out)
}

/// Writes one `t,x,y` line per state, replacing `path`.
pub fn save<P: AsRef<Path>>(path: P, states: &[RobotState]) -> io::Result<()> {
    let path = path.as_ref();
    info!("Writing {} robot states to {}", states.len(), path.display());
    write(BufWriter::new(File::create(path)?), states)
}

pub fn write<W: Write>(mut out: W, states: &[RobotState]) -> io::Result<()> {
    for s in states {
        writeln!(out, "{},{},{}", s.t, s.x, s.y)?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn written_log_reads_back() {
        let states = vec![
            RobotState { t: 0, x: 1, y: 1 },
            RobotState { t: 3, x: 2, y: 1 },
        ];
        let mut out = Vec::new();
        write(&mut out, &states).unwrap();
        assert_eq!(String::from_utf8(out.clone()).unwrap(), "0,1,1\n3,2,1\n");
        assert_eq!(parse(Cursor::new(out)).unwrap(), states);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = std::env::temp_dir().join("costmap_replay_no_such_log.txt");
        assert!(matches!(load(&path), Err(ParseError::Io(_))));
    }

    #[test]
    fn saved_file_is_replaced() {
        let path = std::env::temp_dir().join("costmap_replay_saved_log.txt");
        save(&path, &[RobotState { t: 0, x: 5, y: 5 }, RobotState { t: 1, x: 4, y: 4 }]).unwrap();
        save(&path, &[RobotState { t: 0, x: 1, y: 2 }]).unwrap();
        assert_eq!(load(&path).unwrap(), vec![RobotState { t: 0, x: 1, y: 2 }]);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn parses_records_in_order() {
        let states = parse(Cursor::new("0,1,2\n1,3,4\n")).unwrap();
        assert_eq!(
            states,
            vec![
                RobotState { t: 0, x: 1, y: 2 },
                RobotState { t: 1, x: 3, y: 4 }
            ]
        );
    }

    #[test]
    fn empty_log_is_empty() {
        assert!(parse(Cursor::new("")).unwrap().is_empty());
    }

    #[test]
    fn wrong_field_count_fails() {
        assert!(matches!(
            parse(Cursor::new("0,1,2\n1,3\n")),
            Err(ParseError::FieldCount {
                line: 2,
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn non_integer_fails() {
        assert!(matches!(
            parse(Cursor::new("0,1.5,2\n")),
            Err(ParseError::Number { line: 1, .. })
        ));
        assert!(matches!(
            parse(Cursor::new("0,1,2\n\n")),
            Err(ParseError::FieldCount { line: 2, .. })
        ));
    }
}
