//! Maven coordinate parsing and repository layout paths.
//!
//! Two notations are accepted:
//!
//! - `group:artifact:version`
//! - `group.artifact:version`, where the last dot-separated segment of the
//!   first field is taken as the artifact id.
//!
//! The second form cannot express artifact ids that contain dots:
//! `org.scala-lang.scala3-library_3:3.3.0` splits into group
//! `org.scala-lang` and artifact `scala3-library_3`, but
//! `io.netty.netty-codec.http:4.1.0` would yield artifact `http`. Use the
//! three-field form for anything ambiguous.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

/// Which file of a coordinate's version directory is addressed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Binary,
    Sources,
    Javadoc,
}

impl ArtifactKind {
    pub fn classifier(self) -> Option<&'static str> {
        match self {
            ArtifactKind::Binary => None,
            ArtifactKind::Sources => Some("sources"),
            ArtifactKind::Javadoc => Some("javadoc"),
        }
    }
}

impl Coordinate {
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
        }
    }

    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || Error::InvalidCoordinateFormat {
            input: input.to_string(),
        };

        let fields: Vec<&str> = input.trim().split(':').map(str::trim).collect();
        let (group, artifact, version) = match fields.as_slice() {
            [group, artifact, version] => (*group, *artifact, *version),
            [group_artifact, version] => {
                let (group, artifact) = group_artifact.rsplit_once('.').ok_or_else(invalid)?;
                (group, artifact, *version)
            }
            _ => return Err(invalid()),
        };

        if !valid_group(group) || !valid_segment(artifact) || !valid_segment(version) {
            return Err(invalid());
        }
        Ok(Self::new(group, artifact, version))
    }

    /// Group id with dots replaced by `/`, as used in repository URLs.
    pub fn group_path(&self) -> String {
        self.group.replace('.', "/")
    }

    pub fn file_name(&self, kind: ArtifactKind) -> String {
        match kind.classifier() {
            Some(classifier) => format!("{}-{}-{classifier}.jar", self.artifact, self.version),
            None => format!("{}-{}.jar", self.artifact, self.version),
        }
    }

    /// Path of the file relative to a repository root, `/`-separated.
    pub fn repository_path(&self, kind: ArtifactKind) -> String {
        format!(
            "{}/{}/{}/{}",
            self.group_path(),
            self.artifact,
            self.version,
            self.file_name(kind)
        )
    }

    /// Version directory under `root`, mirroring the Maven layout.
    pub fn layout_dir(&self, root: &Path) -> PathBuf {
        let mut dir = root.to_path_buf();
        for segment in self.group.split('.') {
            dir.push(segment);
        }
        dir.push(&self.artifact);
        dir.push(&self.version);
        dir
    }

    pub fn layout_path(&self, root: &Path, kind: ArtifactKind) -> PathBuf {
        self.layout_dir(root).join(self.file_name(kind))
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}

/// Fields become path components of the local layout, so they must not
/// escape it.
fn valid_segment(field: &str) -> bool {
    !field.is_empty() && field != "." && field != ".." && !field.contains(['/', '\\'])
}

fn valid_group(group: &str) -> bool {
    group.split('.').all(valid_segment)
}

/// A coordinate without a version, as taken by `versions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupArtifact {
    pub group: String,
    pub artifact: String,
}

impl GroupArtifact {
    pub fn parse(input: &str) -> Result<Self> {
        match input.trim().split(':').map(str::trim).collect::<Vec<_>>().as_slice() {
            [group, artifact] if valid_group(group) && valid_segment(artifact) => Ok(Self {
                group: group.to_string(),
                artifact: artifact.to_string(),
            }),
            _ => Err(Error::InvalidCoordinateFormat {
                input: input.to_string(),
            }),
        }
    }

    pub fn metadata_path(&self) -> String {
        format!(
            "{}/{}/maven-metadata.xml",
            self.group.replace('.', "/"),
            self.artifact
        )
    }
}
