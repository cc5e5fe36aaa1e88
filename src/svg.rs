//! SVG vector art to project conversion.
//!
//! usvg resolves styles, `use` references and nested transforms; every visible
//! path left in the tree becomes one `path` layer with its absolute transform
//! baked into the vertices.

use anyhow::{Context, Result};
use std::collections::HashSet;
use studio_core::color;
use studio_core::model::{Element, Geometry, Layer, Project, Style};
use usvg::tiny_skia_path::{PathSegment, Point};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvgImportOptions {
    pub fps: f64,
    /// Seconds.
    pub duration: f64,
}

impl Default for SvgImportOptions {
    fn default() -> Self {
        SvgImportOptions {
            fps: 30.0,
            duration: 2.0,
        }
    }
}

pub fn import_svg(text: &str) -> Result<Project> {
    import_svg_with(text, &SvgImportOptions::default())
}

pub fn import_svg_with(text: &str, options: &SvgImportOptions) -> Result<Project> {
    let tree = usvg::Tree::from_str(text, &usvg::Options::default())
        .context("Failed to parse SVG")?;
    let size = tree.size();
    let mut project = Project::new(
        "svg",
        size.width().ceil() as u32,
        size.height().ceil() as u32,
        options.fps,
        options.duration,
    )?;

    let mut collector = Collector::default();
    collector.group(tree.root());
    for layer in collector.layers {
        project.add_layer(layer)?;
    }
    tracing::info!(
        "Imported {} paths from a {}x{} SVG",
        project.layers.len(),
        project.width,
        project.height
    );
    Ok(project)
}

#[derive(Default)]
struct Collector {
    layers: Vec<Layer>,
    ids: HashSet<String>,
}

impl Collector {
    fn group(&mut self, group: &usvg::Group) {
        for node in group.children() {
            match node {
                usvg::Node::Group(child) => self.group(child),
                usvg::Node::Path(path) => self.path(path),
                _ => tracing::debug!("Skipping non-path SVG node {:?}", node.id()),
            }
        }
    }

    fn path(&mut self, path: &usvg::Path) {
        if !path.is_visible() {
            return;
        }
        let d = path_data(path.data(), path.abs_transform());
        if d.is_empty() {
            return;
        }

        let id = self.unique_id(path.id());
        let mut element = Element::new(id.clone(), Geometry::Path { d });
        element.style = style(path);
        self.layers.push(Layer::new(id, element));
    }

    fn unique_id(&mut self, preferred: &str) -> String {
        let mut id = if preferred.is_empty() {
            format!("path-{}", self.layers.len() + 1)
        } else {
            preferred.to_string()
        };
        let mut n = 1;
        while self.ids.contains(&id) {
            n += 1;
            id = format!("{preferred}-{n}");
        }
        self.ids.insert(id.clone());
        id
    }
}

fn paint_hex(paint: &usvg::Paint) -> Option<String> {
    match paint {
        usvg::Paint::Color(c) => Some(color::to_hex([c.red, c.green, c.blue])),
        // Gradients and patterns have no flat color to carry over.
        _ => None,
    }
}

fn style(path: &usvg::Path) -> Style {
    let fill = path.fill();
    let stroke = path.stroke();
    Style {
        fill: Some(
            fill.and_then(|f| paint_hex(f.paint()))
                .unwrap_or_else(|| "none".to_string()),
        ),
        stroke: stroke.and_then(|s| paint_hex(s.paint())),
        stroke_width: stroke.map(|s| s.width().get() as f64),
        opacity: fill
            .map(|f| f.opacity().get() as f64)
            .filter(|o| *o < 1.0),
    }
}

fn path_data(data: &usvg::tiny_skia_path::Path, ts: usvg::Transform) -> String {
    let map = |p: Point| {
        let x = ts.sx * p.x + ts.kx * p.y + ts.tx;
        let y = ts.ky * p.x + ts.sy * p.y + ts.ty;
        format!("{} {}", x as f64, y as f64)
    };

    let mut d = String::new();
    for segment in data.segments() {
        let command = match segment {
            PathSegment::MoveTo(p) => format!("M{} ", map(p)),
            PathSegment::LineTo(p) => format!("L{} ", map(p)),
            PathSegment::QuadTo(c, p) => format!("Q{} {} ", map(c), map(p)),
            PathSegment::CubicTo(c1, c2, p) => {
                format!("C{} {} {} ", map(c1), map(c2), map(p))
            }
            PathSegment::Close => "Z ".to_string(),
        };
        d.push_str(&command);
    }
    d.truncate(d.trim_end().len());
    d
}
