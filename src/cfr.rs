use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use ignore::WalkBuilder;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use zip::CompressionMethod;
use zip::write::{FileOptions, ZipWriter};

use crate::downloader::Downloader;
use crate::error::{Error, Result};
use crate::transport::Transport;

pub const CFR_URL: &str = "https://github.com/leibnitz27/cfr/releases/download/0.152/cfr-0.152.jar";
pub const JAVA_ENV: &str = "JAR_FETCH_JAVA";
pub const DECOMPILE_TIMEOUT: Duration = Duration::from_secs(300);
const JAVA_CHECK_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

fn java_command(java_bin: &str) -> Command {
    #[cfg(windows)]
    {
        let lower = java_bin.to_ascii_lowercase();
        if lower.ends_with(".cmd") || lower.ends_with(".bat") {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(java_bin);
            return cmd;
        }
    }

    Command::new(java_bin)
}

/// Runs `java_bin` with `args`, killing it once `timeout` has elapsed.
/// A timeout is reported as [`io::ErrorKind::TimedOut`].
fn run_java(java_bin: &str, args: &[&str], timeout: Duration) -> io::Result<Output> {
    let mut child = java_command(java_bin)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            warn!(java = java_bin, ?timeout, "killing java process");
            let _ = child.kill();
            let _ = child.wait();
            return Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("timed out after {timeout:?}"),
            ));
        }
        thread::sleep(POLL_INTERVAL);
    };

    Ok(Output {
        status,
        stdout: stdout.join().unwrap_or_default(),
        stderr: stderr.join().unwrap_or_default(),
    })
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

fn utf8<'p>(path: &'p Path, what: &str) -> Result<&'p str> {
    path.to_str()
        .ok_or_else(|| Error::InvalidArguments(format!("{what} path is not valid UTF-8: {}", path.display())))
}

/// CFR, run as `java -jar cfr.jar`. The jar is downloaded on first use.
pub struct Cfr<T> {
    cfr_jar: PathBuf,
    java: String,
    timeout: Duration,
    downloader: Downloader<T>,
}

impl<T: Transport> Cfr<T> {
    pub fn new(cfr_jar: PathBuf, transport: T) -> Self {
        let java = std::env::var(JAVA_ENV).unwrap_or_else(|_| "java".to_string());
        Self {
            cfr_jar,
            java,
            timeout: DECOMPILE_TIMEOUT,
            downloader: Downloader::new(transport),
        }
    }

    pub fn with_java(mut self, java: impl Into<String>) -> Self {
        self.java = java.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cfr_jar(&self) -> &Path {
        &self.cfr_jar
    }

    pub fn ensure_installed(&self) -> Result<&Path> {
        if self.cfr_jar.exists() {
            return Ok(&self.cfr_jar);
        }

        info!(path = %self.cfr_jar.display(), "CFR not found, downloading");
        self.downloader
            .download(CFR_URL, &self.cfr_jar)
            .map_err(|e| Error::DecompilerUnavailable {
                reason: format!("failed to download CFR from {CFR_URL}: {e}"),
            })?;
        Ok(&self.cfr_jar)
    }

    pub fn check_java(&self) -> Result<()> {
        let output = run_java(&self.java, &["-version"], JAVA_CHECK_TIMEOUT).map_err(|e| {
            Error::DecompilerUnavailable {
                reason: format!("failed to execute '{}' (is a JRE/JDK installed?): {e}", self.java),
            }
        })?;
        if !output.status.success() {
            return Err(Error::DecompilerUnavailable {
                reason: format!("'{} -version' exited with {}", self.java, output.status),
            });
        }
        Ok(())
    }

    /// Decompiles every class of `jar_path` into a source tree under
    /// `output_dir` and returns that directory.
    pub fn decompile(&self, jar_path: &Path, output_dir: &Path) -> Result<PathBuf> {
        if !jar_path.is_file() {
            return Err(Error::io(
                jar_path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "JAR file not found"),
            ));
        }
        self.check_java()?;
        let cfr_jar = self.ensure_installed()?;

        std::fs::create_dir_all(output_dir).map_err(|e| Error::io(output_dir, e))?;

        info!(jar = %jar_path.display(), out = %output_dir.display(), "decompiling");
        let output = run_java(
            &self.java,
            &[
                "-jar",
                utf8(cfr_jar, "cfr.jar")?,
                utf8(jar_path, "jar")?,
                "--outputdir",
                utf8(output_dir, "output")?,
                "--silent",
                "true",
                "--recover",
                "true",
                "--allowcorrecting",
                "true",
                "--caseinsensitivefs",
                "true",
            ],
            self.timeout,
        )
        .map_err(|e| match e.kind() {
            io::ErrorKind::TimedOut => Error::DecompileFailed {
                stderr: format!("CFR {e}"),
            },
            _ => Error::DecompilerUnavailable {
                reason: format!("failed to execute '{}': {e}", self.java),
            },
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::DecompileFailed {
                stderr: stderr.trim().to_string(),
            });
        }

        debug!(files = java_sources(output_dir).len(), "decompiled");
        Ok(output_dir.to_path_buf())
    }
}

/// All `.java` files under `root`, sorted.
pub fn java_sources(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.into_path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "java"))
        .collect();
    files.sort();
    files
}

/// Packs the `.java` files of a decompiled tree into a sources JAR, with
/// entry names relative to `tree`. Returns the number of entries.
pub fn package_sources(tree: &Path, jar_out: &Path) -> Result<usize> {
    let parent = jar_out
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;

    let zip_err = |e: zip::result::ZipError| Error::io(jar_out, std::io::Error::other(e));

    let tmp = NamedTempFile::new_in(parent).map_err(|e| Error::io(parent, e))?;
    let mut zip = ZipWriter::new(tmp);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    let sources = java_sources(tree);
    for file in &sources {
        let Ok(rel) = file.strip_prefix(tree) else {
            continue;
        };
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let content = std::fs::read(file).map_err(|e| Error::io(file, e))?;
        zip.start_file(name, options).map_err(zip_err)?;
        zip.write_all(&content).map_err(|e| Error::io(jar_out, e))?;
    }

    let tmp = zip.finish().map_err(zip_err)?;
    tmp.persist(jar_out).map_err(|e| Error::io(jar_out, e.error))?;
    info!(jar = %jar_out.display(), entries = sources.len(), "packaged sources");
    Ok(sources.len())
}

#[cfg(all(test, unix))]
pub(crate) mod tests {
    use super::*;
    use crate::transport::fake::FakeTransport;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub(crate) fn make_executable(path: &Path) {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms).unwrap();
    }

    /// A `java` stand-in that answers `-version` and, for `-jar`, writes one
    /// class into the `--outputdir` argument.
    pub(crate) fn fake_java(dir: &Path) -> PathBuf {
        let java = dir.join("bin").join("java");
        write_file(
            &java,
            r#"#!/bin/sh
if [ "$1" = "-version" ]; then
  echo 'openjdk version "17"' >&2
  exit 0
fi
if [ "$4" = "--outputdir" ]; then
  mkdir -p "$5/com/example"
  cat > "$5/com/example/Demo.java" <<'EOF'
package com.example;

public class Demo {
}
EOF
  exit 0
fi
echo "unexpected args: $*" >&2
exit 1
"#,
        );
        make_executable(&java);
        java
    }

    #[test]
    fn decompile_writes_tree_into_output_dir() {
        let base = TempDir::new().unwrap();
        let cfr_jar = base.path().join("cfr.jar");
        let jar = base.path().join("demo.jar");
        write_file(&cfr_jar, "stub");
        write_file(&jar, "stub");
        let java = fake_java(base.path());

        let cfr = Cfr::new(cfr_jar, FakeTransport::new()).with_java(java.to_string_lossy());
        let out = base.path().join("out");
        let tree = cfr.decompile(&jar, &out).unwrap();

        assert_eq!(tree, out);
        assert_eq!(java_sources(&out), vec![out.join("com/example/Demo.java")]);
    }

    #[test]
    fn decompile_surfaces_cfr_stderr() {
        let base = TempDir::new().unwrap();
        let cfr_jar = base.path().join("cfr.jar");
        let jar = base.path().join("demo.jar");
        write_file(&cfr_jar, "stub");
        write_file(&jar, "stub");
        let java = base.path().join("java");
        write_file(
            &java,
            "#!/bin/sh\n[ \"$1\" = \"-version\" ] && exit 0\necho 'boom from fake cfr' >&2\nexit 1\n",
        );
        make_executable(&java);

        let cfr = Cfr::new(cfr_jar, FakeTransport::new()).with_java(java.to_string_lossy());
        let err = cfr.decompile(&jar, &base.path().join("out")).unwrap_err();
        assert!(matches!(&err, Error::DecompileFailed { stderr } if stderr == "boom from fake cfr"));
        assert!(err.to_string().contains("CFR decompilation failed"));
    }

    #[test]
    fn hung_cfr_is_killed_at_the_deadline() {
        let base = TempDir::new().unwrap();
        let cfr_jar = base.path().join("cfr.jar");
        let jar = base.path().join("demo.jar");
        write_file(&cfr_jar, "stub");
        write_file(&jar, "stub");
        let java = base.path().join("java");
        write_file(
            &java,
            "#!/bin/sh\n[ \"$1\" = \"-version\" ] && exit 0\nexec sleep 5\n",
        );
        make_executable(&java);

        let cfr = Cfr::new(cfr_jar, FakeTransport::new())
            .with_java(java.to_string_lossy())
            .with_timeout(Duration::from_millis(200));
        let started = Instant::now();
        let err = cfr.decompile(&jar, &base.path().join("out")).unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(4));
        assert!(matches!(&err, Error::DecompileFailed { stderr } if stderr.contains("timed out")));
    }

    #[test]
    fn missing_java_is_decompiler_unavailable() {
        let base = TempDir::new().unwrap();
        let jar = base.path().join("demo.jar");
        write_file(&jar, "stub");

        let cfr = Cfr::new(base.path().join("cfr.jar"), FakeTransport::new())
            .with_java(base.path().join("no-such-java").to_string_lossy());
        let err = cfr.decompile(&jar, &base.path().join("out")).unwrap_err();
        assert!(matches!(err, Error::DecompilerUnavailable { .. }));
    }

    #[test]
    fn missing_jar_is_io_error() {
        let base = TempDir::new().unwrap();
        let cfr = Cfr::new(base.path().join("cfr.jar"), FakeTransport::new());
        let err = cfr
            .decompile(&base.path().join("nope.jar"), &base.path().join("out"))
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn cfr_is_downloaded_once_and_reused() {
        let base = TempDir::new().unwrap();
        let cfr_jar = base.path().join("tools").join("cfr.jar");
        let transport = FakeTransport::new().serve(CFR_URL, b"cfr-bytes");

        let cfr = Cfr::new(cfr_jar.clone(), &transport);
        cfr.ensure_installed().unwrap();
        cfr.ensure_installed().unwrap();

        assert_eq!(fs::read(&cfr_jar).unwrap(), b"cfr-bytes");
        assert_eq!(transport.requests(), vec![format!("GET {CFR_URL}")]);
    }

    #[test]
    fn cfr_download_failure_is_decompiler_unavailable() {
        let base = TempDir::new().unwrap();
        let cfr = Cfr::new(base.path().join("cfr.jar"), FakeTransport::new());
        assert!(matches!(
            cfr.ensure_installed().unwrap_err(),
            Error::DecompilerUnavailable { .. }
        ));
    }

    #[test]
    fn package_sources_keeps_only_java_files() {
        use std::io::Read;

        let base = TempDir::new().unwrap();
        let tree = base.path().join("tree");
        write_file(&tree.join("org/example/A.java"), "class A {}");
        write_file(&tree.join("org/example/B.java"), "class B {}");
        write_file(&tree.join("summary.txt"), "not a source");

        let jar = base.path().join("out").join("demo-1.0-sources.jar");
        assert_eq!(package_sources(&tree, &jar).unwrap(), 2);

        let mut archive = zip::ZipArchive::new(fs::File::open(&jar).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["org/example/A.java", "org/example/B.java"]);

        let mut content = String::new();
        archive
            .by_name("org/example/A.java")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "class A {}");
    }
}
