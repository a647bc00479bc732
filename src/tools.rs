// ffprobe/ffmpeg lookup
//
// Each tool resolves from its environment override, then a copy shipped
// next to the executable (or in bin/), then PATH.

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Ffprobe,
    Ffmpeg,
}

impl Tool {
    pub const ALL: [Tool; 2] = [Tool::Ffprobe, Tool::Ffmpeg];

    pub fn binary_name(self) -> &'static str {
        match self {
            Tool::Ffprobe => "ffprobe",
            Tool::Ffmpeg => "ffmpeg",
        }
    }

    pub fn env_key(self) -> &'static str {
        match self {
            Tool::Ffprobe => "NVR_FFPROBE_PATH",
            Tool::Ffmpeg => "NVR_FFMPEG_PATH",
        }
    }

    /// What indexing loses while this tool is missing
    pub fn missing_impact(self) -> &'static str {
        match self {
            Tool::Ffprobe => "every extraction will fail until it is installed",
            Tool::Ffmpeg => "recordings will be indexed without thumbnails",
        }
    }

    pub fn path(self) -> PathBuf {
        resolve(env::var_os(self.env_key()).map(PathBuf::from), exe_dir().as_deref(), self)
    }

    pub fn is_available(self) -> bool {
        let path = self.path();
        if path.exists() {
            return true;
        }

        // Bare name: only running it tells us whether PATH has it
        Command::new(&path)
            .arg("-version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary_name())
    }
}

fn exe_dir() -> Option<PathBuf> {
    env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
}

fn resolve(override_path: Option<PathBuf>, exe_dir: Option<&Path>, tool: Tool) -> PathBuf {
    if let Some(p) = override_path {
        if p.exists() {
            return p;
        }
        log::warn!("{} points at missing file {}, ignoring", tool.env_key(), p.display());
    }

    let mut filename = tool.binary_name().to_string();
    if cfg!(windows) {
        filename.push_str(".exe");
    }

    if let Some(dir) = exe_dir {
        for candidate in [dir.join(&filename), dir.join("bin").join(&filename)] {
            if candidate.exists() {
                return candidate;
            }
        }
    }

    PathBuf::from(tool.binary_name())
}

pub fn ffprobe_path() -> PathBuf {
    Tool::Ffprobe.path()
}

pub fn ffmpeg_path() -> PathBuf {
    Tool::Ffmpeg.path()
}

/// Tools that cannot be run from where they resolve to.
pub fn missing_tools() -> Vec<Tool> {
    Tool::ALL.into_iter().filter(|t| !t.is_available()).collect()
}
