use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};
use tracing::{debug, info};

use crate::sim::{Animation, SpriteSheet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownDefType,
    UnknownField,
    DuplicateField,
    MissingField,
    InvalidValue,
    DuplicateName,
    TextureSize,
}

#[derive(Debug, Clone)]
pub struct ContentCompileError {
    pub code: ContentErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for ContentCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for ContentCompileError {}

/// Named animation templates and font paths, read-only once compiled.
///
/// `animation` hands out a fresh clone so every attach starts from frame 0.
#[derive(Debug, Clone, Default)]
pub struct AssetCatalog {
    animations: BTreeMap<String, Animation>,
    fonts: BTreeMap<String, PathBuf>,
}

impl AssetCatalog {
    /// Compiles every `*.xml` under `defs_dir` in sorted relative-path order.
    /// Texture and font paths are resolved against `assets_dir`.
    pub fn compile(assets_dir: &Path, defs_dir: &Path) -> Result<Self, ContentCompileError> {
        let xml_files = collect_xml_files_sorted(defs_dir)
            .map_err(|error| read_error(error.path, error.source))?;
        let mut catalog = Self::default();
        let mut seen_names = HashSet::<String>::new();

        for xml_file in xml_files {
            let raw = fs::read_to_string(&xml_file)
                .map_err(|source| read_error(xml_file.clone(), source))?;
            let defs = parse_assets_document(assets_dir, &xml_file, &raw)?;
            debug!(file = %xml_file.display(), defs = defs.len(), "asset_file_compiled");
            for def in defs {
                if !seen_names.insert(def.key().to_string()) {
                    return Err(ContentCompileError {
                        code: ContentErrorCode::DuplicateName,
                        message: format!("duplicate asset name '{}'", def.key()),
                        file_path: xml_file.clone(),
                        location: None,
                    });
                }
                match def {
                    PendingDef::Animation(animation) => catalog.insert_animation(animation),
                    PendingDef::Font { name, path } => {
                        catalog.fonts.insert(name, path);
                    }
                }
            }
        }

        info!(
            animations = catalog.animations.len(),
            fonts = catalog.fonts.len(),
            defs_dir = %defs_dir.display(),
            "asset_catalog_compiled"
        );
        Ok(catalog)
    }

    pub fn insert_animation(&mut self, animation: Animation) {
        self.animations.insert(animation.name().to_string(), animation);
    }

    pub fn insert_font(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.fonts.insert(name.into(), path.into());
    }

    pub fn animation(&self, name: &str) -> Option<Animation> {
        self.animations.get(name).cloned()
    }

    pub fn has_animation(&self, name: &str) -> bool {
        self.animations.contains_key(name)
    }

    pub fn animation_names(&self) -> impl Iterator<Item = &str> {
        self.animations.keys().map(String::as_str)
    }

    pub fn font(&self, name: &str) -> Option<&Path> {
        self.fonts.get(name).map(PathBuf::as_path)
    }

    pub fn animation_count(&self) -> usize {
        self.animations.len()
    }

    pub fn font_count(&self) -> usize {
        self.fonts.len()
    }
}

enum PendingDef {
    Animation(Animation),
    Font { name: String, path: PathBuf },
}

impl PendingDef {
    fn key(&self) -> &str {
        match self {
            Self::Animation(animation) => animation.name(),
            Self::Font { name, .. } => name,
        }
    }
}

struct XmlContext<'a, 'input> {
    file_path: &'a Path,
    doc: &'a Document<'input>,
}

impl XmlContext<'_, '_> {
    fn error_at(
        &self,
        code: ContentErrorCode,
        message: String,
        node: Node<'_, '_>,
    ) -> ContentCompileError {
        let pos = self.doc.text_pos_at(node.range().start);
        ContentCompileError {
            code,
            message,
            file_path: self.file_path.to_path_buf(),
            location: Some(SourceLocation {
                line: pos.row as usize,
                column: pos.col as usize,
            }),
        }
    }

    fn required_text(
        &self,
        node: Node<'_, '_>,
        field_name: &str,
    ) -> Result<String, ContentCompileError> {
        let value = node.text().map(str::trim).unwrap_or_default().to_string();
        if value.is_empty() {
            return Err(self.error_at(
                ContentErrorCode::MissingField,
                format!("field <{field_name}> must not be empty"),
                node,
            ));
        }
        Ok(value)
    }

    fn parse_count(
        &self,
        node: Node<'_, '_>,
        field_name: &str,
    ) -> Result<usize, ContentCompileError> {
        let value = self.required_text(node, field_name)?;
        value.parse::<usize>().map_err(|_| {
            self.error_at(
                ContentErrorCode::InvalidValue,
                format!("{field_name} '{value}' is not a non-negative integer"),
                node,
            )
        })
    }

    fn parse_extent(
        &self,
        node: Node<'_, '_>,
        field_name: &str,
    ) -> Result<f32, ContentCompileError> {
        let value = self.required_text(node, field_name)?;
        match value.parse::<f32>() {
            Ok(parsed) if parsed.is_finite() && parsed > 0.0 => Ok(parsed),
            _ => Err(self.error_at(
                ContentErrorCode::InvalidValue,
                format!("{field_name} '{value}' must be a finite number > 0"),
                node,
            )),
        }
    }
}

fn parse_assets_document(
    assets_dir: &Path,
    file_path: &Path,
    raw: &str,
) -> Result<Vec<PendingDef>, ContentCompileError> {
    let doc = Document::parse(raw).map_err(|error| ContentCompileError {
        code: ContentErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;
    let ctx = XmlContext {
        file_path,
        doc: &doc,
    };

    let root = doc.root_element();
    if root.tag_name().name() != "Assets" {
        return Err(ctx.error_at(
            ContentErrorCode::InvalidRoot,
            "root element must be <Assets>".to_string(),
            root,
        ));
    }

    let mut defs = Vec::new();
    for child in root.children().filter(|node| node.is_element()) {
        let def = match child.tag_name().name() {
            "AnimationDef" => {
                PendingDef::Animation(parse_animation_def(&ctx, assets_dir, child)?)
            }
            "FontDef" => parse_font_def(&ctx, assets_dir, child)?,
            other => {
                return Err(ctx.error_at(
                    ContentErrorCode::UnknownDefType,
                    format!(
                        "unsupported def type <{other}>; expected <AnimationDef> or <FontDef>"
                    ),
                    child,
                ))
            }
        };
        defs.push(def);
    }

    Ok(defs)
}

fn parse_animation_def(
    ctx: &XmlContext<'_, '_>,
    assets_dir: &Path,
    node: Node<'_, '_>,
) -> Result<Animation, ContentCompileError> {
    let mut seen_fields = HashSet::<String>::new();
    let mut name: Option<String> = None;
    let mut texture: Option<(String, Node<'_, '_>)> = None;
    let mut frames: Option<usize> = None;
    let mut speed: Option<usize> = None;
    let mut sheet_width: Option<f32> = None;
    let mut sheet_height: Option<f32> = None;

    for field in node.children().filter(|child| child.is_element()) {
        let field_name = field.tag_name().name().to_string();
        if !seen_fields.insert(field_name.clone()) {
            return Err(ctx.error_at(
                ContentErrorCode::DuplicateField,
                format!("duplicate field <{field_name}> in <AnimationDef>"),
                field,
            ));
        }

        match field_name.as_str() {
            "name" => name = Some(ctx.required_text(field, "name")?),
            "texture" => texture = Some((ctx.required_text(field, "texture")?, field)),
            "frames" => frames = Some(ctx.parse_count(field, "frames")?),
            "speed" => speed = Some(ctx.parse_count(field, "speed")?),
            "sheetWidth" => sheet_width = Some(ctx.parse_extent(field, "sheetWidth")?),
            "sheetHeight" => sheet_height = Some(ctx.parse_extent(field, "sheetHeight")?),
            _ => {
                return Err(ctx.error_at(
                    ContentErrorCode::UnknownField,
                    format!("unknown field <{field_name}> in <AnimationDef>"),
                    field,
                ))
            }
        }
    }

    let Some(name) = name else {
        return Err(ctx.error_at(
            ContentErrorCode::MissingField,
            "missing required field <name> in <AnimationDef>".to_string(),
            node,
        ));
    };
    let Some((texture, texture_node)) = texture else {
        return Err(ctx.error_at(
            ContentErrorCode::MissingField,
            format!("missing required field <texture> in <AnimationDef> '{name}'"),
            node,
        ));
    };

    let (width, height) = match (sheet_width, sheet_height) {
        (Some(width), Some(height)) => (width, height),
        (None, None) => {
            let texture_path = assets_dir.join(&texture);
            let (width, height) = image::image_dimensions(&texture_path).map_err(|error| {
                ctx.error_at(
                    ContentErrorCode::TextureSize,
                    format!(
                        "cannot read size of texture {}: {error}",
                        texture_path.display()
                    ),
                    texture_node,
                )
            })?;
            (width as f32, height as f32)
        }
        _ => {
            return Err(ctx.error_at(
                ContentErrorCode::MissingField,
                format!(
                    "<AnimationDef> '{name}' must give both <sheetWidth> and <sheetHeight> \
                     or neither"
                ),
                node,
            ))
        }
    };

    let sheet = SpriteSheet::new(texture, width, height);
    Ok(Animation::with_frames(
        name,
        sheet,
        frames.unwrap_or(1),
        speed.unwrap_or(0),
    ))
}

fn parse_font_def(
    ctx: &XmlContext<'_, '_>,
    assets_dir: &Path,
    node: Node<'_, '_>,
) -> Result<PendingDef, ContentCompileError> {
    let mut seen_fields = HashSet::<String>::new();
    let mut name: Option<String> = None;
    let mut path: Option<String> = None;

    for field in node.children().filter(|child| child.is_element()) {
        let field_name = field.tag_name().name().to_string();
        if !seen_fields.insert(field_name.clone()) {
            return Err(ctx.error_at(
                ContentErrorCode::DuplicateField,
                format!("duplicate field <{field_name}> in <FontDef>"),
                field,
            ));
        }
        match field_name.as_str() {
            "name" => name = Some(ctx.required_text(field, "name")?),
            "path" => path = Some(ctx.required_text(field, "path")?),
            _ => {
                return Err(ctx.error_at(
                    ContentErrorCode::UnknownField,
                    format!("unknown field <{field_name}> in <FontDef>"),
                    field,
                ))
            }
        }
    }

    match (name, path) {
        (Some(name), Some(path)) => Ok(PendingDef::Font {
            name,
            path: assets_dir.join(path),
        }),
        (None, _) => Err(ctx.error_at(
            ContentErrorCode::MissingField,
            "missing required field <name> in <FontDef>".to_string(),
            node,
        )),
        (Some(_), None) => Err(ctx.error_at(
            ContentErrorCode::MissingField,
            "missing required field <path> in <FontDef>".to_string(),
            node,
        )),
    }
}

struct ReadError {
    path: PathBuf,
    source: std::io::Error,
}

fn collect_xml_files_sorted(root: &Path) -> Result<Vec<PathBuf>, ReadError> {
    let mut files = Vec::<PathBuf>::new();
    collect_recursive(root, &mut files)?;
    files.sort_by_cached_key(|path| normalize_rel_path(path.strip_prefix(root).unwrap_or(path)));
    Ok(files)
}

fn collect_recursive(current: &Path, files: &mut Vec<PathBuf>) -> Result<(), ReadError> {
    let entries = fs::read_dir(current).map_err(|source| ReadError {
        path: current.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| ReadError {
            path: current.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_recursive(&path, files)?;
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        {
            files.push(path);
        }
    }
    Ok(())
}

fn normalize_rel_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_error(path: PathBuf, source: std::io::Error) -> ContentCompileError {
    ContentCompileError {
        code: ContentErrorCode::ReadFile,
        message: format!("failed to read asset definitions: {source}"),
        file_path: path,
        location: None,
    }
}
