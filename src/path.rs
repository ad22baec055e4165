//! Decoding of the constrained path grammar used by shape outlines.
//!
//! We understand absolute `M`, `L`, `H`, `V` and `Z`, plus the relative
//! `l`, `h` and `v`. Every command may repeat its argument list (so
//! `l 1,0 2,0` draws two segments), and extra coordinate pairs after an `M`
//! are implicit linetos. Curves are not supported: they produce
//! [`PathError::UnsupportedCommand`] rather than silently wrong geometry.

use std::ops::Range;

use arrayvec::ArrayVec;
use kurbo::Point;

/// The path data could not be turned into vertices.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// A curve command (`C`, `Q`, `S`, `T`, `A`, or a relative form) was found.
    #[error("unsupported path command `{command}` at byte {offset}")]
    UnsupportedCommand {
        /// The command letter, as written.
        command: char,
        /// Byte offset of the command in the path data.
        offset: usize,
    },
    /// Something that isn't part of the grammar was found (only reported by
    /// strict tokenizers; lenient ones skip it).
    #[error("malformed path data at byte {offset}")]
    Malformed {
        /// Byte offset of the offending token.
        offset: usize,
    },
}

/// A byte-level scanner over path data.
///
/// Everything the grammar cares about is ASCII, so we can walk bytes and only
/// ever slice the source at ASCII positions.
#[derive(Clone, Debug)]
pub(crate) struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

const COMMAND_LETTERS: &[u8] = b"MmLlHhVvZzCcSsQqTtAa";

impl<'a> Lexer<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Lexer { src, pos: 0 }
    }

    pub(crate) fn offset(&self) -> usize {
        self.pos
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    /// Skips whitespace and commas.
    pub(crate) fn skip_separators(&mut self) {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() || b == b',' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    pub(crate) fn at_number(&self) -> bool {
        matches!(self.peek(), Some(b'0'..=b'9' | b'.' | b'+' | b'-'))
    }

    /// Reads a command letter, if the next byte is one.
    pub(crate) fn read_command(&mut self) -> Option<char> {
        let b = self.peek()?;
        if COMMAND_LETTERS.contains(&b) {
            self.pos += 1;
            Some(b as char)
        } else {
            None
        }
    }

    /// Reads a number like `2`, `-1.5`, `.5` or `1.23e-6`.
    ///
    /// On failure, nothing is consumed.
    pub(crate) fn read_number(&mut self) -> Option<f64> {
        let bytes = self.src.as_bytes();
        let start = self.pos;
        let mut end = start;
        let digits = |mut i: usize| {
            while bytes.get(i).is_some_and(u8::is_ascii_digit) {
                i += 1;
            }
            i
        };

        if matches!(bytes.get(end), Some(b'+' | b'-')) {
            end += 1;
        }
        let int_end = digits(end);
        let mut mantissa_digits = int_end - end;
        end = int_end;
        if bytes.get(end) == Some(&b'.') {
            let frac_end = digits(end + 1);
            mantissa_digits += frac_end - (end + 1);
            end = frac_end;
        }
        if mantissa_digits == 0 {
            return None;
        }
        if matches!(bytes.get(end), Some(b'e' | b'E')) {
            let mut exp = end + 1;
            if matches!(bytes.get(exp), Some(b'+' | b'-')) {
                exp += 1;
            }
            let exp_end = digits(exp);
            // A dangling `e` belongs to whatever comes next, not to us.
            if exp_end > exp {
                end = exp_end;
            }
        }

        let value = self.src[start..end].parse().ok()?;
        self.pos = end;
        Some(value)
    }

    /// Reads `N` numbers, separated by whitespace or commas.
    ///
    /// On failure, the position is left after whatever was successfully read.
    pub(crate) fn read_numbers<const N: usize>(&mut self) -> Option<ArrayVec<f64, N>> {
        let mut ret = ArrayVec::new();
        for i in 0..N {
            if i > 0 {
                self.skip_separators();
            }
            ret.push(self.read_number()?);
        }
        Some(ret)
    }

    /// Moves on to the next command letter, making sure to move past `from`.
    fn skip_to_command(&mut self, from: usize) {
        if self.pos <= from {
            self.pos = from + 1;
        }
        while let Some(b) = self.peek() {
            if COMMAND_LETTERS.contains(&b) {
                break;
            }
            self.pos += 1;
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    MoveTo,
    LineTo,
    HorizontalTo,
    VerticalTo,
    RelLineTo,
    RelHorizontalTo,
    RelVerticalTo,
    Close,
}

impl Command {
    /// Decodes a command letter.
    ///
    /// `Ok(None)` means the letter is part of the SVG grammar that we don't
    /// even try to support (like a relative moveto).
    fn from_letter(letter: char) -> Result<Option<Command>, ()> {
        Ok(Some(match letter {
            'M' => Command::MoveTo,
            'L' => Command::LineTo,
            'H' => Command::HorizontalTo,
            'V' => Command::VerticalTo,
            'l' => Command::RelLineTo,
            'h' => Command::RelHorizontalTo,
            'v' => Command::RelVerticalTo,
            'Z' | 'z' => Command::Close,
            'C' | 'c' | 'Q' | 'q' | 'S' | 's' | 'T' | 't' | 'A' | 'a' => return Err(()),
            _ => return Ok(None),
        }))
    }
}

/// One thing that happened to the drawing cursor.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Step {
    /// The cursor moved and left a vertex behind.
    Vertex { point: Point, subpath_start: bool },
    /// The subpath was closed. `point` is the closing vertex, unless the
    /// cursor was already sitting on the subpath's origin.
    Close { point: Option<Point> },
}

/// A path's vertices, in the order the tokenizer yields them, together
/// with the loops they form.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Outline {
    /// Every vertex.
    pub vertices: Vec<Point>,
    /// The range of `vertices` making up each loop.
    pub loops: Vec<Range<usize>>,
}

impl Outline {
    /// An outline with a single loop through all of `vertices`.
    ///
    /// With no vertices, there are no loops either.
    pub fn ring(vertices: Vec<Point>) -> Self {
        let loops = if vertices.is_empty() {
            vec![]
        } else {
            vec![0..vertices.len()]
        };
        Outline { vertices, loops }
    }

    /// The vertices of each loop.
    pub fn loops(&self) -> impl Iterator<Item = &[Point]> + '_ {
        self.loops.iter().map(|r| &self.vertices[r.clone()])
    }
}

/// An iterator over the vertices described by a path's `d` attribute.
///
/// This yields `Result`s; after the first error it yields nothing more.
///
/// ```
/// use shapegraph::PathTokenizer;
///
/// let points = PathTokenizer::new("M 0,0 L 10,0 L 10,10 Z")
///     .collect::<Result<Vec<_>, _>>()
///     .unwrap();
/// assert_eq!(points.len(), 4);
/// assert_eq!(points[3], kurbo::Point::new(0.0, 0.0));
/// ```
#[derive(Clone, Debug)]
pub struct PathTokenizer<'a> {
    lexer: Lexer<'a>,
    strict: bool,
    // The command whose arguments we're currently reading.
    command: Option<Command>,
    // True if `command` hasn't consumed any arguments yet.
    pending: bool,
    cursor: Point,
    origin: Option<Point>,
    last: Option<Point>,
    finished: bool,
}

impl<'a> PathTokenizer<'a> {
    /// Creates a lenient tokenizer, which skips over anything it doesn't understand.
    pub fn new(data: &'a str) -> Self {
        PathTokenizer {
            lexer: Lexer::new(data),
            strict: false,
            command: None,
            pending: false,
            cursor: Point::ZERO,
            origin: None,
            last: None,
            finished: false,
        }
    }

    /// Creates a tokenizer that fails with [`PathError::Malformed`] on
    /// anything it doesn't understand.
    pub fn strict(data: &'a str) -> Self {
        PathTokenizer {
            strict: true,
            ..PathTokenizer::new(data)
        }
    }

    /// Creates a strict or lenient tokenizer.
    pub fn with_strictness(data: &'a str, strict: bool) -> Self {
        if strict {
            Self::strict(data)
        } else {
            Self::new(data)
        }
    }

    /// Reads the whole path, splitting its vertices into loops.
    ///
    /// A new loop starts at every moveto, and a loop ends after every close.
    /// Drawing on after a close without a moveto starts a new loop at the old
    /// subpath's origin: that loop's range begins at the closing vertex, so
    /// neighboring ranges can share one vertex. Empty loops are omitted.
    pub fn outline(mut self) -> Result<Outline, PathError> {
        let mut vertices: Vec<Point> = Vec::new();
        let mut loops = Vec::new();
        // Where the loop being drawn starts.
        let mut start: Option<usize> = None;
        while let Some(step) = self.step() {
            match step? {
                Step::Vertex {
                    point,
                    subpath_start,
                } => {
                    if subpath_start {
                        if let Some(s) = start.take() {
                            loops.push(s..vertices.len());
                        }
                    }
                    if start.is_none() {
                        // `self.origin` is the origin of the closed subpath; the
                        // cursor moved away from it to produce `point`.
                        let resumes = !subpath_start
                            && self.origin.is_some_and(|o| o != point)
                            && vertices.last() == self.origin.as_ref();
                        start = Some(if resumes {
                            vertices.len() - 1
                        } else {
                            vertices.len()
                        });
                    }
                    vertices.push(point);
                }
                Step::Close { point } => {
                    if let Some(p) = point {
                        start = start.or(Some(vertices.len()));
                        vertices.push(p);
                    }
                    if let Some(s) = start.take() {
                        loops.push(s..vertices.len());
                    }
                }
            }
        }
        if let Some(s) = start {
            loops.push(s..vertices.len());
        }
        Ok(Outline { vertices, loops })
    }

    /// Splits the path into closed loops, one per subpath.
    ///
    /// See [`PathTokenizer::outline`] for where loops start and end.
    pub fn loops(self) -> Result<Vec<Vec<Point>>, PathError> {
        let outline = self.outline()?;
        Ok(outline.loops().map(<[Point]>::to_vec).collect())
    }

    fn fail(&mut self, err: PathError) -> Option<Result<Step, PathError>> {
        self.finished = true;
        Some(Err(err))
    }

    // Handles a token that isn't in the grammar. Returns `Some` if we should stop.
    fn malformed(&mut self, offset: usize) -> Option<Option<Result<Step, PathError>>> {
        if self.strict {
            return Some(self.fail(PathError::Malformed { offset }));
        }
        tracing::debug!(offset, "skipping malformed path data");
        self.command = None;
        self.pending = false;
        self.lexer.skip_to_command(offset);
        None
    }

    fn emit(&mut self, subpath_start: bool) -> Step {
        if self.origin.is_none() || subpath_start {
            self.origin = Some(self.cursor);
        }
        self.last = Some(self.cursor);
        Step::Vertex {
            point: self.cursor,
            subpath_start,
        }
    }

    // Applies one repetition of `command`, assuming that the lexer is sitting
    // on its arguments.
    fn apply(&mut self, command: Command) -> Option<Step> {
        let step = match command {
            Command::MoveTo | Command::LineTo => {
                let [x, y] = self.lexer.read_numbers::<2>()?.into_inner().ok()?;
                self.cursor = Point::new(x, y);
                if command == Command::MoveTo {
                    // Any further pairs are implicit linetos.
                    self.command = Some(Command::LineTo);
                }
                self.emit(command == Command::MoveTo)
            }
            Command::RelLineTo => {
                let [dx, dy] = self.lexer.read_numbers::<2>()?.into_inner().ok()?;
                self.cursor += kurbo::Vec2::new(dx, dy);
                self.emit(false)
            }
            Command::HorizontalTo => {
                self.cursor.x = self.lexer.read_number()?;
                self.emit(false)
            }
            Command::VerticalTo => {
                self.cursor.y = self.lexer.read_number()?;
                self.emit(false)
            }
            Command::RelHorizontalTo => {
                self.cursor.x += self.lexer.read_number()?;
                self.emit(false)
            }
            Command::RelVerticalTo => {
                self.cursor.y += self.lexer.read_number()?;
                self.emit(false)
            }
            Command::Close => unreachable!("close takes no arguments"),
        };
        self.pending = false;
        Some(step)
    }

    fn close(&mut self) -> Step {
        self.command = None;
        let Some(origin) = self.origin else {
            return Step::Close { point: None };
        };
        self.cursor = origin;
        if self.last == Some(origin) {
            Step::Close { point: None }
        } else {
            self.last = Some(origin);
            Step::Close {
                point: Some(origin),
            }
        }
    }

    fn step(&mut self) -> Option<Result<Step, PathError>> {
        if self.finished {
            return None;
        }

        loop {
            self.lexer.skip_separators();
            let offset = self.lexer.offset();
            if self.lexer.at_end() {
                self.finished = true;
                if self.pending && self.strict {
                    return Some(Err(PathError::Malformed { offset }));
                }
                return None;
            }

            if let Some(command) = self.command {
                if self.lexer.at_number() {
                    match self.apply(command) {
                        Some(step) => return Some(Ok(step)),
                        None => match self.malformed(offset) {
                            Some(ret) => return ret,
                            None => continue,
                        },
                    }
                }
            }

            let Some(letter) = self.lexer.read_command() else {
                match self.malformed(offset) {
                    Some(ret) => return ret,
                    None => continue,
                }
            };
            if self.pending && self.strict {
                // The previous command never got its arguments.
                return self.fail(PathError::Malformed { offset });
            }

            match Command::from_letter(letter) {
                Err(()) => {
                    return self.fail(PathError::UnsupportedCommand {
                        command: letter,
                        offset,
                    });
                }
                Ok(None) => match self.malformed(offset) {
                    Some(ret) => return ret,
                    None => continue,
                },
                Ok(Some(Command::Close)) => {
                    self.pending = false;
                    return Some(Ok(self.close()));
                }
                Ok(Some(command)) => {
                    self.command = Some(command);
                    self.pending = true;
                }
            }
        }
    }
}

impl Iterator for PathTokenizer<'_> {
    type Item = Result<Point, PathError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.step()? {
                Ok(Step::Vertex { point, .. }) | Ok(Step::Close { point: Some(point) }) => {
                    return Some(Ok(point))
                }
                Ok(Step::Close { point: None }) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl std::iter::FusedIterator for PathTokenizer<'_> {}

/// Recognizes the path data of a two-point connector.
///
/// A connector is exactly one moveto followed by exactly one lineto,
/// horizontal lineto or vertical lineto (absolute or relative). Anything else
/// (more segments, curves, trailing junk) is not a connector and gives `None`.
pub fn connector_endpoints(data: &str) -> Option<(Point, Point)> {
    let mut lexer = Lexer::new(data);
    lexer.skip_separators();
    if lexer.read_command()? != 'M' {
        return None;
    }
    lexer.skip_separators();
    let [x, y] = lexer.read_numbers::<2>()?.into_inner().ok()?;
    let start = Point::new(x, y);

    lexer.skip_separators();
    let command = lexer.read_command()?;
    lexer.skip_separators();
    let end = match command {
        'L' | 'l' => {
            let [x, y] = lexer.read_numbers::<2>()?.into_inner().ok()?;
            if command == 'L' {
                Point::new(x, y)
            } else {
                start + kurbo::Vec2::new(x, y)
            }
        }
        'H' => Point::new(lexer.read_number()?, start.y),
        'h' => Point::new(start.x + lexer.read_number()?, start.y),
        'V' => Point::new(start.x, lexer.read_number()?),
        'v' => Point::new(start.x, start.y + lexer.read_number()?),
        _ => return None,
    };

    lexer.skip_separators();
    lexer.at_end().then_some((start, end))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn points(data: &str) -> Vec<Point> {
        PathTokenizer::new(data)
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn closed_triangle() {
        assert_eq!(
            points("M 0,0 L 10,0 L 10,10 Z"),
            vec![p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 0.0)]
        );
    }

    #[test]
    fn close_does_not_duplicate_origin() {
        assert_eq!(
            points("M 0,0 L 10,0 L 10,10 L 0,0 Z"),
            vec![p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 0.0)]
        );
    }

    #[test]
    fn relative_repetition() {
        assert_eq!(
            points("M 0,0 l 1,0 2,0"),
            vec![p(0.0, 0.0), p(1.0, 0.0), p(3.0, 0.0)]
        );
        assert_eq!(
            points("M 1,1 h 2 3 v -1 -1"),
            vec![p(1.0, 1.0), p(3.0, 1.0), p(6.0, 1.0), p(6.0, 0.0), p(6.0, -1.0)]
        );
    }

    #[test]
    fn horizontal_and_vertical() {
        assert_eq!(
            points("M 5,5 H 8 V 9 H 5 Z"),
            vec![p(5.0, 5.0), p(8.0, 5.0), p(8.0, 9.0), p(5.0, 9.0), p(5.0, 5.0)]
        );
    }

    #[test]
    fn compact_syntax() {
        assert_eq!(
            points("M0,0L1.5e1,0V-.5z"),
            vec![p(0.0, 0.0), p(15.0, 0.0), p(15.0, -0.5), p(0.0, 0.0)]
        );
        // Extra pairs after a moveto draw lines.
        assert_eq!(
            points("M 0 0 1 0 1 1"),
            vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)]
        );
    }

    #[test]
    fn curves_are_rejected() {
        let mut tok = PathTokenizer::new("M 0,0 C 1,1 2,2 3,3");
        assert_eq!(tok.next(), Some(Ok(p(0.0, 0.0))));
        assert_matches!(
            tok.next(),
            Some(Err(PathError::UnsupportedCommand {
                command: 'C',
                offset: 6
            }))
        );
        assert_eq!(tok.next(), None);

        assert_matches!(
            PathTokenizer::new("M 0,0 q 1,1 2,2").collect::<Result<Vec<_>, _>>(),
            Err(PathError::UnsupportedCommand { command: 'q', .. })
        );
    }

    #[test]
    fn lenient_skips_junk() {
        assert_eq!(
            points("M 0,0 L 1,# L 2,0 m 4,4 L 2,2"),
            vec![p(0.0, 0.0), p(2.0, 0.0), p(2.0, 2.0)]
        );
    }

    #[test]
    fn strict_rejects_junk() {
        let strict = |data| PathTokenizer::strict(data).collect::<Result<Vec<_>, _>>();
        assert_matches!(
            strict("M 0,0 L 1,# L 2,0"),
            Err(PathError::Malformed { offset: 8 })
        );
        assert_matches!(strict("M 0,0 m 1,1"), Err(PathError::Malformed { offset: 6 }));
        assert_matches!(strict("M L 1,1"), Err(PathError::Malformed { offset: 2 }));
        assert_matches!(strict("M 0,0 L"), Err(PathError::Malformed { offset: 7 }));
        assert_matches!(strict("3,4"), Err(PathError::Malformed { offset: 0 }));
        assert!(strict("M 0,0 L 1,0 Z").is_ok());
    }

    #[test]
    fn subpath_loops() {
        let loops = PathTokenizer::new("M 0,0 H 4 V 4 H 0 Z M 1,1 V 3 H 3 V 1 Z")
            .loops()
            .unwrap();
        assert_eq!(loops.len(), 2);
        assert_eq!(loops[0].len(), 5);
        assert_eq!(loops[1][0], p(1.0, 1.0));
        assert_eq!(loops[1].last(), Some(&p(1.0, 1.0)));

        // Drawing on after a close restarts from the origin.
        let loops = PathTokenizer::new("M 0,0 H 1 V 1 Z L 0,-1 H -1 Z")
            .loops()
            .unwrap();
        assert_eq!(
            loops[1],
            vec![p(0.0, 0.0), p(0.0, -1.0), p(-1.0, -1.0), p(0.0, 0.0)]
        );
    }

    #[test]
    fn outline_matches_vertex_stream() {
        let data = "M 0,0 H 1 V 1 Z L 0,-1 H -1 Z M 5,5 H 6 V 6";
        let outline = PathTokenizer::new(data).outline().unwrap();
        let stream = PathTokenizer::new(data)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(outline.vertices, stream);
        // The second loop shares the first loop's closing vertex.
        assert_eq!(outline.loops, [0..4, 3..7, 7..10]);
        assert!(outline.vertices.windows(2).all(|w| w[0] != w[1]));

        assert_eq!(
            Outline::ring(vec![p(0.0, 0.0), p(1.0, 0.0)]).loops,
            [0..2]
        );
        assert!(Outline::ring(vec![]).loops.is_empty());
    }

    #[test]
    fn connectors() {
        assert_eq!(
            connector_endpoints("M 10,20 L 30,40"),
            Some((p(10.0, 20.0), p(30.0, 40.0)))
        );
        assert_eq!(
            connector_endpoints(" M 10,20 V 5 "),
            Some((p(10.0, 20.0), p(10.0, 5.0)))
        );
        assert_eq!(
            connector_endpoints("M 10,20 h -4"),
            Some((p(10.0, 20.0), p(6.0, 20.0)))
        );
        assert_eq!(connector_endpoints("M 10,20 L 30,40 L 0,0"), None);
        assert_eq!(connector_endpoints("M 10,20 C 1,1 2,2 3,3"), None);
        assert_eq!(connector_endpoints("M 10,20"), None);
        assert_eq!(connector_endpoints("L 10,20 L 1,1"), None);
    }

    #[test]
    fn arbitrary_path_data() {
        arbtest::arbtest(|u| {
            let data = crate::arbitrary::path_data(u)?;
            let lenient = PathTokenizer::new(&data).collect::<Result<Vec<_>, _>>();
            if let Ok(strict) = PathTokenizer::strict(&data).collect::<Result<Vec<_>, _>>() {
                assert_eq!(lenient, Ok(strict));
            }
            Ok(())
        });
    }

    proptest! {
        // On input that's entirely in the grammar, strict and lenient agree.
        #[test]
        fn strict_matches_lenient(cmds in prop::collection::vec((0usize..6, -100i32..100, -100i32..100), 0..20)) {
            let mut data = String::from("M 0,0");
            for (c, x, y) in cmds {
                let cmd = match c {
                    0 => format!(" L {x},{y}"),
                    1 => format!(" H {x}"),
                    2 => format!(" V {y}"),
                    3 => format!(" l {x},{y} {y},{x}"),
                    4 => format!(" h {x} v {y}"),
                    _ => " Z".to_owned(),
                };
                data.push_str(&cmd);
            }
            let strict = PathTokenizer::strict(&data).collect::<Result<Vec<_>, _>>().unwrap();
            let lenient = PathTokenizer::new(&data).collect::<Result<Vec<_>, _>>().unwrap();
            prop_assert_eq!(strict, lenient);
        }

        // Lenient tokenizers never panic and never loop forever.
        #[test]
        fn lenient_terminates(data in ".*") {
            let _ = PathTokenizer::new(&data).count();
        }
    }
}
