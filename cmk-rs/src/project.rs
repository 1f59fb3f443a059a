//! Recorded project model.
//!
//! Data-recording commands (`project`, `add_library`, `add_executable`,
//! `target_*`, `mark_as_advanced`) only write into a [`Project`]; nothing is
//! built.  Embedders read the record after the script finishes.

use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryType {
    Static,
    Shared,
    Module,
    Interface,
    Object,
}

impl LibraryType {
    pub fn parse(s: &str) -> Option<LibraryType> {
        match s {
            "STATIC" => Some(LibraryType::Static),
            "SHARED" => Some(LibraryType::Shared),
            "MODULE" => Some(LibraryType::Module),
            "INTERFACE" => Some(LibraryType::Interface),
            "OBJECT" => Some(LibraryType::Object),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LibraryType::Static => "STATIC",
            LibraryType::Shared => "SHARED",
            LibraryType::Module => "MODULE",
            LibraryType::Interface => "INTERFACE",
            LibraryType::Object => "OBJECT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetKind {
    Library(LibraryType),
    Executable,
    /// `add_library(name ALIAS real)`.
    Alias(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Private,
    Public,
    Interface,
}

impl Visibility {
    pub const ALL: [Visibility; 3] = [Visibility::Private, Visibility::Public, Visibility::Interface];

    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Private => "PRIVATE",
            Visibility::Public => "PUBLIC",
            Visibility::Interface => "INTERFACE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub kind: TargetKind,
    pub imported: bool,
    pub sources: Vec<String>,
    pub include_dirs: Vec<(Visibility, String)>,
    pub link_libraries: Vec<(Visibility, String)>,
}

impl Target {
    pub fn new(name: impl Into<String>, kind: TargetKind) -> Self {
        Target {
            name: name.into(),
            kind,
            imported: false,
            sources: Vec::new(),
            include_dirs: Vec::new(),
            link_libraries: Vec::new(),
        }
    }
}

/// Everything the data-recording commands wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Project {
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub languages: Vec<String>,
    pub targets: Vec<Target>,
    pub advanced: BTreeSet<String>,
}

impl Project {
    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }

    /// Look a target up, following one level of alias.
    pub fn target_mut(&mut self, name: &str) -> Option<&mut Target> {
        let real = match self.target(name).map(|t| &t.kind) {
            Some(TargetKind::Alias(real)) => real.clone(),
            Some(_) => name.to_owned(),
            None => return None,
        };
        self.targets.iter_mut().find(|t| t.name == real)
    }

    /// Add a target; fails if the name is taken.
    pub fn add_target(&mut self, target: Target) -> Result<(), String> {
        if self.target(&target.name).is_some() {
            return Err(format!(
                "cannot create target \"{}\" because another target with the same name already exists.",
                target.name
            ));
        }
        self.targets.push(target);
        Ok(())
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => {
                write!(f, "Project: {name}")?;
                if let Some(v) = self.version.as_deref().filter(|v| !v.is_empty()) {
                    write!(f, " {v}")?;
                }
                writeln!(f)?;
            }
            None => writeln!(f, "Project: (none)")?,
        }
        if let Some(d) = self.description.as_deref().filter(|d| !d.is_empty()) {
            writeln!(f, "  Description: {d}")?;
        }
        if let Some(h) = self.homepage.as_deref().filter(|h| !h.is_empty()) {
            writeln!(f, "  Homepage: {h}")?;
        }
        if !self.languages.is_empty() {
            writeln!(f, "  Languages: {}", self.languages.join(" "))?;
        }
        writeln!(f, "Targets: {}", self.targets.len())?;
        for t in &self.targets {
            let kind = match &t.kind {
                TargetKind::Library(ty) => format!("{} library", ty.as_str()),
                TargetKind::Executable => "executable".to_owned(),
                TargetKind::Alias(real) => format!("alias of {real}"),
            };
            let imported = if t.imported { ", imported" } else { "" };
            writeln!(f, "  {} ({kind}{imported})", t.name)?;
            if !t.sources.is_empty() {
                writeln!(f, "    sources: {}", t.sources.join(" "))?;
            }
            for (vis, dir) in &t.include_dirs {
                writeln!(f, "    include: {} {dir}", vis.as_str())?;
            }
            for (vis, lib) in &t.link_libraries {
                writeln!(f, "    link: {} {lib}", vis.as_str())?;
            }
        }
        if !self.advanced.is_empty() {
            let names: Vec<&str> = self.advanced.iter().map(String::as_str).collect();
            writeln!(f, "Advanced: {}", names.join(" "))?;
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
