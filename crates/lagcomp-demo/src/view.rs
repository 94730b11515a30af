use lagcomp::{Entity, Error, RenderSink, ViewerId};

/// Latest positions per viewer, one slot per player entity.
#[derive(Debug, Clone)]
pub struct TrackView {
    tracks: Vec<Vec<Option<f32>>>,
}

impl TrackView {
    pub fn new(players: usize) -> Self {
        Self {
            tracks: vec![vec![None; players]; players + 1],
        }
    }

    pub fn track(&self, viewer: ViewerId) -> &[Option<f32>] {
        self.tracks
            .get(viewer as usize)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn viewers(&self) -> usize {
        self.tracks.len()
    }
}

impl RenderSink for TrackView {
    fn render(&mut self, viewer: ViewerId, entities: &[Entity]) -> lagcomp::Result<()> {
        let track = self
            .tracks
            .get_mut(viewer as usize)
            .ok_or(Error::UnknownViewer { viewer })?;

        for entity in entities {
            let slot = track
                .get_mut(entity.id as usize)
                .ok_or(Error::UnknownEntity {
                    viewer,
                    entity: entity.id,
                })?;
            *slot = Some(entity.position);
        }
        Ok(())
    }
}
