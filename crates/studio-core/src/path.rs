//! Path mini-language codec.
//!
//! Parses the `M L H V C Q Z` subset of SVG path data (absolute and
//! relative) into Lottie bezier paths, and writes Lottie paths back out as
//! path data. Lottie stores tangents as offsets from their vertex, so the
//! builder converts every absolute control point on the way in and back on
//! the way out.

use glam::DVec2;
use kurbo::{BezPath, Point, Rect, Shape};
use lottie_data::model::BezierPath;
use thiserror::Error;

/// Vertices closer than this are considered the same point when closing.
const COINCIDENT_EPSILON: f64 = 1e-9;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("Unsupported path command '{command}' at offset {offset}")]
    Unsupported { command: char, offset: usize },

    #[error("Malformed number at offset {offset}")]
    InvalidNumber { offset: usize },

    #[error("Path command '{command}' at offset {offset} takes {expected} arguments per segment, found {found}")]
    MissingArguments {
        command: char,
        offset: usize,
        expected: usize,
        found: usize,
    },
}

/// A command the lenient parser dropped, with its byte offset in the input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkippedCommand {
    pub command: char,
    pub offset: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPath {
    pub subpaths: Vec<BezierPath>,
    pub skipped: Vec<SkippedCommand>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Command(char, usize),
    Number(f64, usize),
}

fn tokenize(d: &str, strict: bool) -> Result<Vec<Token>, PathError> {
    let bytes = d.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let b = bytes[pos];
        if b.is_ascii_whitespace() || b == b',' {
            pos += 1;
        } else if b.is_ascii_alphabetic() {
            tokens.push(Token::Command(b as char, pos));
            pos += 1;
        } else if b.is_ascii_digit() || b == b'-' || b == b'+' || b == b'.' {
            let (value, end) = scan_number(bytes, pos);
            match value {
                Some(v) => tokens.push(Token::Number(v, pos)),
                None if strict => return Err(PathError::InvalidNumber { offset: pos }),
                None => tracing::warn!("Skipping malformed number in path data at offset {}", pos),
            }
            pos = end.max(pos + 1);
        } else if strict {
            return Err(PathError::InvalidNumber { offset: pos });
        } else {
            tracing::warn!(
                "Skipping unexpected character {:?} in path data at offset {}",
                b as char,
                pos
            );
            pos += 1;
        }
    }

    Ok(tokens)
}

/// Scan one number starting at `start`. Numbers end where the grammar no
/// longer allows them to continue, so `10-5` and `.5.5` are two numbers each.
fn scan_number(bytes: &[u8], start: usize) -> (Option<f64>, usize) {
    let mut pos = start;
    if matches!(bytes.get(pos), Some(b'-' | b'+')) {
        pos += 1;
    }

    let int_start = pos;
    while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
        pos += 1;
    }
    let mut digits = pos - int_start;

    if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        let frac_start = pos;
        while bytes.get(pos).is_some_and(u8::is_ascii_digit) {
            pos += 1;
        }
        digits += pos - frac_start;
    }

    if digits == 0 {
        return (None, pos);
    }

    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        let mut exp = pos + 1;
        if matches!(bytes.get(exp), Some(b'-' | b'+')) {
            exp += 1;
        }
        if bytes.get(exp).is_some_and(u8::is_ascii_digit) {
            while bytes.get(exp).is_some_and(u8::is_ascii_digit) {
                exp += 1;
            }
            pos = exp;
        }
    }

    let text = std::str::from_utf8(&bytes[start..pos]).ok();
    (text.and_then(|t| t.parse::<f64>().ok()), pos)
}

/// Accumulates vertices and tangent offsets for the subpath being drawn.
#[derive(Default)]
struct Builder {
    finished: Vec<BezierPath>,
    vertices: Vec<DVec2>,
    in_tangents: Vec<DVec2>,
    out_tangents: Vec<DVec2>,
    closed: bool,
    current: DVec2,
    start: DVec2,
}

impl Builder {
    fn flush(&mut self) {
        if self.vertices.is_empty() {
            return;
        }
        let to_arrays =
            |points: &mut Vec<DVec2>| -> Vec<[f64; 2]> { points.drain(..).map(|p| p.to_array()).collect() };
        self.finished.push(BezierPath {
            c: self.closed,
            v: to_arrays(&mut self.vertices),
            i: to_arrays(&mut self.in_tangents),
            o: to_arrays(&mut self.out_tangents),
        });
        self.closed = false;
    }

    fn push_vertex(&mut self, point: DVec2, in_tangent: DVec2) {
        self.vertices.push(point);
        self.in_tangents.push(in_tangent);
        self.out_tangents.push(DVec2::ZERO);
        self.current = point;
    }

    /// Drawing after a `Z`, or without any `M`, implicitly starts a subpath
    /// at the current point.
    fn ensure_open(&mut self) {
        if self.closed {
            self.flush();
        }
        if self.vertices.is_empty() {
            self.start = self.current;
            self.push_vertex(self.current, DVec2::ZERO);
        }
    }

    fn move_to(&mut self, point: DVec2) {
        self.flush();
        self.start = point;
        self.push_vertex(point, DVec2::ZERO);
    }

    fn line_to(&mut self, point: DVec2) {
        self.ensure_open();
        self.push_vertex(point, DVec2::ZERO);
    }

    fn cubic_to(&mut self, c1: DVec2, c2: DVec2, point: DVec2) {
        self.ensure_open();
        if let (Some(out), Some(&last)) = (self.out_tangents.last_mut(), self.vertices.last()) {
            *out = c1 - last;
        }
        self.push_vertex(point, c2 - point);
    }

    fn quad_to(&mut self, control: DVec2, point: DVec2) {
        let from = self.current;
        let c1 = from + (control - from) * (2.0 / 3.0);
        let c2 = point + (control - point) * (2.0 / 3.0);
        self.cubic_to(c1, c2, point);
    }

    fn close(&mut self) {
        if self.vertices.is_empty() {
            return;
        }
        if self.vertices.len() > 1 {
            let first = self.vertices[0];
            let last_idx = self.vertices.len() - 1;
            if self.vertices[last_idx].abs_diff_eq(first, COINCIDENT_EPSILON) {
                // The closing segment now ends on the first vertex, so its
                // incoming tangent moves there.
                self.in_tangents[0] = self.in_tangents[last_idx];
                self.vertices.pop();
                self.in_tangents.pop();
                self.out_tangents.pop();
            }
        }
        self.closed = true;
        self.current = self.start;
    }

    fn finish(mut self) -> Vec<BezierPath> {
        self.flush();
        self.finished
    }
}

fn arity(command: char) -> Option<usize> {
    match command.to_ascii_uppercase() {
        'M' | 'L' => Some(2),
        'H' | 'V' => Some(1),
        'C' => Some(6),
        'Q' => Some(4),
        'Z' => Some(0),
        _ => None,
    }
}

fn parse_with(d: &str, strict: bool) -> Result<ParsedPath, PathError> {
    let tokens = tokenize(d, strict)?;
    let mut builder = Builder::default();
    let mut skipped = Vec::new();
    let mut idx = 0;

    while idx < tokens.len() {
        let (command, offset) = match tokens[idx] {
            Token::Command(c, offset) => (c, offset),
            Token::Number(_, offset) => {
                if strict {
                    return Err(PathError::InvalidNumber { offset });
                }
                tracing::warn!("Ignoring path number without a command at offset {}", offset);
                idx += 1;
                continue;
            }
        };
        idx += 1;

        let arg_start = idx;
        while let Some(Token::Number(..)) = tokens.get(idx) {
            idx += 1;
        }
        let args: Vec<f64> = tokens[arg_start..idx]
            .iter()
            .filter_map(|t| match t {
                Token::Number(v, _) => Some(*v),
                Token::Command(..) => None,
            })
            .collect();

        let Some(arity) = arity(command) else {
            if strict {
                return Err(PathError::Unsupported { command, offset });
            }
            tracing::warn!(
                "Skipping unsupported path command '{}' at offset {} ({} arguments)",
                command,
                offset,
                args.len()
            );
            skipped.push(SkippedCommand { command, offset });
            continue;
        };

        if arity == 0 {
            builder.close();
            if !args.is_empty() {
                if strict {
                    return Err(PathError::MissingArguments {
                        command,
                        offset,
                        expected: 0,
                        found: args.len(),
                    });
                }
                tracing::warn!("Ignoring {} stray numbers after '{}'", args.len(), command);
            }
            continue;
        }

        let remainder = args.len() % arity;
        if args.is_empty() || remainder != 0 {
            if strict {
                return Err(PathError::MissingArguments {
                    command,
                    offset,
                    expected: arity,
                    found: args.len(),
                });
            }
            tracing::warn!(
                "Path command '{}' at offset {} has {} arguments, dropping the incomplete segment",
                command,
                offset,
                args.len()
            );
        }

        let relative = command.is_ascii_lowercase();
        for (n, group) in args.chunks_exact(arity).enumerate() {
            apply(&mut builder, command, relative, n, group);
        }
    }

    Ok(ParsedPath {
        subpaths: builder.finish(),
        skipped,
    })
}

fn apply(builder: &mut Builder, command: char, relative: bool, repeat: usize, a: &[f64]) {
    let origin = if relative { builder.current } else { DVec2::ZERO };
    let pt = |x: f64, y: f64| origin + DVec2::new(x, y);

    match command.to_ascii_uppercase() {
        // Pairs after the first one of a move are implicit line segments.
        'M' if repeat == 0 => builder.move_to(pt(a[0], a[1])),
        'M' | 'L' => builder.line_to(pt(a[0], a[1])),
        'H' => {
            let x = if relative { builder.current.x + a[0] } else { a[0] };
            builder.line_to(DVec2::new(x, builder.current.y));
        }
        'V' => {
            let y = if relative { builder.current.y + a[0] } else { a[0] };
            builder.line_to(DVec2::new(builder.current.x, y));
        }
        'C' => builder.cubic_to(pt(a[0], a[1]), pt(a[2], a[3]), pt(a[4], a[5])),
        'Q' => builder.quad_to(pt(a[0], a[1]), pt(a[2], a[3])),
        _ => {}
    }
}

/// Parse path data leniently. Unsupported commands are skipped together
/// with their arguments and listed in [`ParsedPath::skipped`].
pub fn parse(d: &str) -> ParsedPath {
    // Lenient mode never produces an error.
    parse_with(d, false).unwrap_or_default()
}

/// Parse path data, failing on the first unsupported command or malformed
/// argument list.
pub fn parse_path_strict(d: &str) -> Result<Vec<BezierPath>, PathError> {
    parse_with(d, true).map(|parsed| parsed.subpaths)
}

/// One Lottie path per subpath.
pub fn parse_subpaths(d: &str) -> Vec<BezierPath> {
    parse(d).subpaths
}

/// All subpaths joined into a single Lottie path, closed if any subpath was.
pub fn parse_path(d: &str) -> BezierPath {
    let mut joined = BezierPath::default();
    for sub in parse_subpaths(d) {
        joined.c |= sub.c;
        joined.v.extend(sub.v);
        joined.i.extend(sub.i);
        joined.o.extend(sub.o);
    }
    joined
}

/// A path through `points` with straight segments.
pub fn polyline(points: &[[f64; 2]], closed: bool) -> BezierPath {
    BezierPath {
        c: closed,
        v: points.to_vec(),
        i: vec![[0.0, 0.0]; points.len()],
        o: vec![[0.0, 0.0]; points.len()],
    }
}

fn tangent(list: &[[f64; 2]], idx: usize) -> DVec2 {
    list.get(idx).copied().map(DVec2::from).unwrap_or(DVec2::ZERO)
}

/// Absolute control points of the segment from vertex `from` to vertex `to`,
/// or `None` when the segment is straight.
fn segment_controls(path: &BezierPath, from: usize, to: usize) -> Option<(DVec2, DVec2)> {
    let out = tangent(&path.o, from);
    let inn = tangent(&path.i, to);
    if out == DVec2::ZERO && inn == DVec2::ZERO {
        return None;
    }
    Some((
        DVec2::from(path.v[from]) + out,
        DVec2::from(path.v[to]) + inn,
    ))
}

fn fmt_num(v: f64) -> String {
    // Avoid "-0" in output.
    if v == 0.0 {
        "0".to_string()
    } else {
        format!("{v}")
    }
}

fn push_point(out: &mut String, p: DVec2) {
    out.push_str(&format!(" {} {}", fmt_num(p.x), fmt_num(p.y)));
}

/// Write Lottie paths back out as path data: `L` for straight segments,
/// `C` for curved ones and `Z` for closed paths.
pub fn to_path_string(paths: &[BezierPath]) -> String {
    let mut out = String::new();
    for path in paths {
        let Some(&first) = path.v.first() else {
            continue;
        };
        if !out.is_empty() {
            out.push(' ');
        }
        out.push('M');
        push_point(&mut out, first.into());

        let n = path.v.len();
        let mut segments: Vec<(usize, usize)> = (1..n).map(|k| (k - 1, k)).collect();
        if path.c && n > 1 {
            segments.push((n - 1, 0));
        }

        for (from, to) in segments {
            let closing = path.c && to == 0;
            match segment_controls(path, from, to) {
                Some((c1, c2)) => {
                    out.push_str(" C");
                    push_point(&mut out, c1);
                    push_point(&mut out, c2);
                    push_point(&mut out, path.v[to].into());
                }
                // Z draws the straight closing segment itself.
                None if closing => {}
                None => {
                    out.push_str(" L");
                    push_point(&mut out, path.v[to].into());
                }
            }
        }

        if path.c {
            out.push_str(" Z");
        }
    }
    out
}

fn point(p: [f64; 2]) -> Point {
    Point::new(p[0], p[1])
}

/// Convert a Lottie path to a kurbo path with absolute control points.
pub fn to_bez_path(path: &BezierPath) -> BezPath {
    let mut bez = BezPath::new();
    let Some(&first) = path.v.first() else {
        return bez;
    };
    bez.move_to(point(first));

    let n = path.v.len();
    let emit = |bez: &mut BezPath, from: usize, to: usize| match segment_controls(path, from, to) {
        Some((c1, c2)) => bez.curve_to(point(c1.to_array()), point(c2.to_array()), point(path.v[to])),
        None => bez.line_to(point(path.v[to])),
    };
    for k in 1..n {
        emit(&mut bez, k - 1, k);
    }
    if path.c && n > 1 {
        emit(&mut bez, n - 1, 0);
        bez.close_path();
    }
    bez
}

/// Curve-accurate bounding box of one or more Lottie paths. `None` when
/// there are no vertices at all.
pub fn bounds(paths: &[BezierPath]) -> Option<Rect> {
    let mut acc: Option<Rect> = None;
    for path in paths {
        for &v in &path.v {
            let p = point(v);
            let r = Rect::from_points(p, p);
            acc = Some(acc.map_or(r, |a| a.union(r)));
        }
        let bez = to_bez_path(path);
        if bez.segments().next().is_some() {
            let r = bez.bounding_box();
            acc = Some(acc.map_or(r, |a| a.union(r)));
        }
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: [f64; 2], b: [f64; 2]) -> bool {
        (a[0] - b[0]).abs() < 1e-9 && (a[1] - b[1]).abs() < 1e-9
    }

    #[test]
    fn open_polyline() {
        let p = parse_path("M 0 0 L 100 0");
        assert_eq!(p.v, vec![[0.0, 0.0], [100.0, 0.0]]);
        assert_eq!(p.i, vec![[0.0, 0.0]; 2]);
        assert_eq!(p.o, vec![[0.0, 0.0]; 2]);
        assert!(!p.c);
    }

    #[test]
    fn closed_square() {
        let p = parse_path("M 0 0 L 100 0 L 100 100 L 0 100 Z");
        assert_eq!(p.v.len(), 4);
        assert!(p.c);
    }

    #[test]
    fn explicit_return_to_start_is_merged_on_close() {
        let p = parse_path("M0 0 L100 0 L100 100 L0 100 L0 0 Z");
        assert_eq!(p.v.len(), 4);
        assert!(p.c);

        let curved = parse_path("M0 0 L10 0 C 10 10 5 15 0 0 Z");
        assert_eq!(curved.v.len(), 2);
        assert!(approx(curved.i[0], [5.0, 15.0]));
        assert!(approx(curved.o[1], [0.0, 10.0]));
    }

    #[test]
    fn relative_commands_and_implicit_lines() {
        let p = parse_path("m 10 10 20 0 0 20 h -20 v -10 z");
        assert_eq!(
            p.v,
            vec![[10.0, 10.0], [30.0, 10.0], [30.0, 30.0], [10.0, 30.0], [10.0, 20.0]]
        );
        assert!(p.c);
    }

    #[test]
    fn cubic_tangents_are_relative_to_their_vertex() {
        let p = parse_path("M 0 0 C 10 0 20 10 20 20");
        assert_eq!(p.v, vec![[0.0, 0.0], [20.0, 20.0]]);
        assert_eq!(p.o[0], [10.0, 0.0]);
        assert_eq!(p.i[1], [0.0, -10.0]);
        assert_eq!(p.o[1], [0.0, 0.0]);
    }

    #[test]
    fn quadratic_is_elevated_to_cubic() {
        let p = parse_path("M 0 0 Q 30 30 60 0");
        assert!(approx(p.o[0], [20.0, 20.0]));
        assert!(approx(p.i[1], [-20.0, 20.0]));
    }

    #[test]
    fn compact_number_grammar() {
        let p = parse_path("M10-5L.5.5l1e1-1E-1");
        assert_eq!(p.v[0], [10.0, -5.0]);
        assert_eq!(p.v[1], [0.5, 0.5]);
        assert!(approx(p.v[2], [10.5, 0.4]));
    }

    #[test]
    fn subpaths_split_at_each_move() {
        let subs = parse_subpaths("M0 0 L1 0 Z M5 5 L6 5");
        assert_eq!(subs.len(), 2);
        assert!(subs[0].c);
        assert!(!subs[1].c);
        assert_eq!(subs[1].v[0], [5.0, 5.0]);

        let joined = parse_path("M0 0 L1 0 Z M5 5 L6 5");
        assert_eq!(joined.v.len(), 4);
        assert!(joined.c);
    }

    #[test]
    fn drawing_after_close_restarts_at_subpath_start() {
        let subs = parse_subpaths("M 5 5 L 10 5 L 10 10 Z L 0 0");
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[1].v, vec![[5.0, 5.0], [0.0, 0.0]]);
    }

    #[test]
    fn unsupported_commands_are_skipped_and_recorded() {
        let parsed = parse("M 0 0 A 5 5 0 0 1 10 10 L 20 0 S 1 2 3 4");
        assert_eq!(parsed.subpaths.len(), 1);
        assert_eq!(parsed.subpaths[0].v, vec![[0.0, 0.0], [20.0, 0.0]]);
        let skipped: Vec<char> = parsed.skipped.iter().map(|s| s.command).collect();
        assert_eq!(skipped, vec!['A', 'S']);
        assert_eq!(parsed.skipped[0].offset, 6);
    }

    #[test]
    fn strict_mode_rejects_what_lenient_mode_skips() {
        assert_eq!(
            parse_path_strict("M 0 0 T 10 10"),
            Err(PathError::Unsupported {
                command: 'T',
                offset: 6
            })
        );
        assert!(matches!(
            parse_path_strict("M 0 0 L 10"),
            Err(PathError::MissingArguments {
                expected: 2,
                found: 1,
                ..
            })
        ));
        assert!(parse_path_strict("M 0 0 L 10 10 Z").is_ok());
    }

    #[test]
    fn path_string_round_trips() {
        let source = "M 0 0 C 10 0 20 10 20 20 L 0 20 Z";
        let paths = parse_subpaths(source);
        let written = to_path_string(&paths);
        assert_eq!(written, "M 0 0 C 10 0 20 10 20 20 L 0 20 Z");
        assert_eq!(parse_subpaths(&written), paths);
    }

    #[test]
    fn curved_closing_segment_is_written_before_z() {
        let paths = parse_subpaths("M0 0 L10 0 C 10 10 5 15 0 0 Z");
        let written = to_path_string(&paths);
        assert_eq!(written, "M 0 0 L 10 0 C 10 10 5 15 0 0 Z");
        assert_eq!(parse_subpaths(&written), paths);
    }

    #[test]
    fn bounds_cover_curves_and_lone_points() {
        let line = parse_subpaths("M 0 0 L 100 50");
        let r = bounds(&line).unwrap();
        assert_eq!((r.x0, r.y0, r.x1, r.y1), (0.0, 0.0, 100.0, 50.0));

        // Control points bulge above y=0 but the curve peaks at 7.5.
        let arch = parse_subpaths("M 0 0 C 0 10 10 10 10 0");
        let r = bounds(&arch).unwrap();
        assert!((r.y1 - 7.5).abs() < 1e-6);

        let dot = parse_subpaths("M 3 4");
        let r = bounds(&dot).unwrap();
        assert_eq!(r.center(), Point::new(3.0, 4.0));

        assert!(bounds(&[]).is_none());
    }
}
