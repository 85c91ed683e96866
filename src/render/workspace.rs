//! Explicit workspace handle for one render session.
//!
//! The source file and the engine's output directory are shared by every
//! attempt of a run; `prepare` fully overwrites the former and clears the
//! latter so an attempt never sees residue from the previous one.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Where generated source is written and where the engine renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderWorkspace {
    root: PathBuf,
    source_file: String,
    scene_class: String,
    env: Vec<(String, String)>,
}

impl RenderWorkspace {
    pub fn new(root: impl Into<PathBuf>, source_file: impl Into<String>, scene_class: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            source_file: source_file.into(),
            scene_class: scene_class.into(),
            env: Vec::new(),
        }
    }

    /// Add an environment variable for the render subprocess
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source_file(&self) -> &str {
        &self.source_file
    }

    pub fn source_path(&self) -> PathBuf {
        self.root.join(&self.source_file)
    }

    /// Source file name without extension; the engine names its output dir after it
    pub fn source_stem(&self) -> &str {
        Path::new(&self.source_file)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.source_file)
    }

    pub fn scene_class(&self) -> &str {
        &self.scene_class
    }

    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    pub fn media_dir(&self) -> PathBuf {
        self.root.join("media")
    }

    /// Output directory for this workspace's source file
    pub fn videos_dir(&self) -> PathBuf {
        self.media_dir().join("videos").join(self.source_stem())
    }

    /// Write a support file (e.g. a scene base class) next to the source
    pub fn install(&self, file_name: &str, contents: &str) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.root)?;
        let path = self.root.join(file_name);
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Remove previous render outputs for this source
    pub fn clear_outputs(&self) -> io::Result<()> {
        for dir in [self.videos_dir(), self.media_dir().join("texts")] {
            match fs::remove_dir_all(&dir) {
                Ok(()) => log::debug!("Removed previous outputs in {}", dir.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Clear outputs and overwrite the source file with `source`.
    pub fn prepare(&self, source: &str) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.root)?;
        self.clear_outputs()?;
        let path = self.source_path();
        fs::write(&path, source)?;
        Ok(path)
    }

    pub fn read_source(&self) -> io::Result<String> {
        fs::read_to_string(self.source_path())
    }

    /// Newest `<SceneClass>.mp4` under this source's output directory.
    pub fn find_artifact(&self) -> Option<PathBuf> {
        let pattern = format!(
            "{}/**/{}.mp4",
            glob::Pattern::escape(&self.videos_dir().to_string_lossy()),
            glob::Pattern::escape(&self.scene_class)
        );

        glob::glob(&pattern)
            .ok()?
            .flatten()
            .filter(|p| p.is_file())
            .max_by_key(|p| {
                fs::metadata(p)
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn workspace(dir: &TempDir) -> RenderWorkspace {
        RenderWorkspace::new(dir.path(), "generated_algo_scene.py", "AlgorithmAnimation")
    }

    #[test]
    fn test_paths() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);
        assert_eq!(ws.source_path(), dir.path().join("generated_algo_scene.py"));
        assert_eq!(ws.source_stem(), "generated_algo_scene");
        assert_eq!(ws.videos_dir(), dir.path().join("media/videos/generated_algo_scene"));
    }

    #[test]
    fn test_with_env() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir).with_env("ALGO_USER_INPUT_DATA", "[1, 2]");
        assert_eq!(ws.env(), &[("ALGO_USER_INPUT_DATA".to_string(), "[1, 2]".to_string())]);
    }

    #[test]
    fn test_prepare_overwrites_source() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);

        ws.prepare("first attempt with a much longer body").unwrap();
        ws.prepare("second").unwrap();
        assert_eq!(ws.read_source().unwrap(), "second");
    }

    #[test]
    fn test_prepare_clears_previous_outputs() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);
        let old_video = ws.videos_dir().join("720p30").join("AlgorithmAnimation.mp4");
        fs::create_dir_all(old_video.parent().unwrap()).unwrap();
        fs::write(&old_video, b"old").unwrap();
        let texts = ws.media_dir().join("texts");
        fs::create_dir_all(&texts).unwrap();

        ws.prepare("code").unwrap();
        assert!(!old_video.exists());
        assert!(!texts.exists());
        assert!(ws.find_artifact().is_none());
    }

    #[test]
    fn test_clear_outputs_leaves_other_scenes() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);
        let other = ws.media_dir().join("videos").join("other_scene");
        fs::create_dir_all(&other).unwrap();

        ws.clear_outputs().unwrap();
        assert!(other.exists());
    }

    #[test]
    fn test_find_artifact() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);
        let video = ws.videos_dir().join("480p15").join("AlgorithmAnimation.mp4");
        fs::create_dir_all(video.parent().unwrap()).unwrap();
        fs::write(&video, b"mp4").unwrap();
        fs::write(ws.videos_dir().join("480p15").join("Other.mp4"), b"mp4").unwrap();

        assert_eq!(ws.find_artifact(), Some(video));
    }

    #[test]
    fn test_install_support_file() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);
        let path = ws.install("base_algorithm_scene.py", "class BaseAlgorithmScene: pass").unwrap();
        assert_eq!(path, dir.path().join("base_algorithm_scene.py"));
        assert_eq!(fs::read_to_string(path).unwrap(), "class BaseAlgorithmScene: pass");
    }
}
