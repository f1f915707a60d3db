//! Recorded landmark sequences.
//!
//! A [`Recording`] is a YAML list of frames, each frame a list of faces and
//! each face a list of `{x, y, z}` points. [`ReplayProvider`] plays one back
//! in a loop, one recorded frame per detection cycle.

use crate::{landmarks::LandmarkFrame, provider::LandmarkProvider, Error, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Detector output captured cycle by cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Recording {
    pub frames: Vec<Vec<LandmarkFrame>>,
}

impl Recording {
    pub fn new(frames: Vec<Vec<LandmarkFrame>>) -> Self {
        Self { frames }
    }

    /// Load a recording from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Save the recording as YAML
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Append one cycle's faces
    pub fn push(&mut self, faces: Vec<LandmarkFrame>) {
        self.frames.push(faces);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Plays a [`Recording`] back as a landmark provider, wrapping at the end
#[derive(Debug, Clone)]
pub struct ReplayProvider {
    recording: Recording,
    position: usize,
}

impl ReplayProvider {
    pub fn new(recording: Recording) -> Self {
        Self { recording, position: 0 }
    }

    /// Cycles served so far
    pub fn position(&self) -> usize {
        self.position
    }
}

impl<F: Send + 'static> LandmarkProvider<F> for ReplayProvider {
    async fn initialize(&mut self) -> Result<()> {
        if self.recording.is_empty() {
            return Err(Error::BackendInit("Recording contains no frames".to_string()));
        }
        info!("Replaying {} recorded frames", self.recording.len());
        Ok(())
    }

    async fn estimate_faces(&mut self, _frame: F) -> Result<Vec<LandmarkFrame>> {
        let len = self.recording.len();
        if len == 0 {
            return Err(Error::ResourceNotReady("Recording contains no frames".to_string()));
        }

        let index = self.position % len;
        if index == 0 && self.position > 0 {
            debug!("Recording wrapped after {} cycles", self.position);
        }
        self.position += 1;

        Ok(self.recording.frames[index].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::LandmarkPoint;

    fn face(x: f64) -> LandmarkFrame {
        LandmarkFrame::new(vec![LandmarkPoint::new(x, 0.0)])
    }

    #[tokio::test]
    async fn test_replay_wraps() {
        let mut provider = ReplayProvider::new(Recording::new(vec![vec![face(1.0)], vec![]]));
        LandmarkProvider::<()>::initialize(&mut provider).await.unwrap();

        assert_eq!(provider.estimate_faces(()).await.unwrap(), vec![face(1.0)]);
        assert!(provider.estimate_faces(()).await.unwrap().is_empty());
        assert_eq!(provider.estimate_faces(()).await.unwrap(), vec![face(1.0)]);
        assert_eq!(provider.position(), 3);
    }

    #[tokio::test]
    async fn test_empty_recording_fails_init() {
        let mut provider = ReplayProvider::new(Recording::default());
        let result = LandmarkProvider::<()>::initialize(&mut provider).await;
        assert!(matches!(result, Err(Error::BackendInit(_))));
    }

    #[test]
    fn test_yaml_layout() {
        let yaml = "- - - {x: 1.0, y: 2.0}\n    - {x: 3.0, y: 4.0, z: 0.5}\n- []\n";
        let recording: Recording = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(recording.len(), 2);
        assert_eq!(recording.frames[0][0].len(), 2);
        assert_eq!(recording.frames[0][0].points()[1].z, Some(0.5));
        assert!(recording.frames[1].is_empty());
    }
}
