//! Ordered collection of captured stills, one per capturing pose.

use crate::{
    pose::{Direction, PoseTarget},
    utils::image_encoding::is_image_data_uri,
    Error, Result,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// One captured still
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedImage {
    /// State that was active when the still was taken
    pub state: PoseTarget,
    /// JPEG encoded as a `data:image/jpeg;base64,` URI
    pub image_data: String,
    /// Direction label used in the registration payload
    pub direction: Direction,
}

impl CapturedImage {
    pub fn new(direction: Direction, image_data: String) -> Self {
        Self {
            state: direction.target(),
            image_data,
            direction,
        }
    }
}

/// Complete five-direction payload for the registration service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionMap {
    pub front: String,
    pub left: String,
    pub right: String,
    pub up: String,
    pub down: String,
}

impl DirectionMap {
    pub fn get(&self, direction: Direction) -> &str {
        match direction {
            Direction::Front => &self.front,
            Direction::Left => &self.left,
            Direction::Right => &self.right,
            Direction::Up => &self.up,
            Direction::Down => &self.down,
        }
    }

    /// Entries in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Direction, &str)> + '_ {
        Direction::ALL.into_iter().map(move |d| (d, self.get(d)))
    }
}

/// Append-only store of captures for the current run
#[derive(Debug, Clone, Default)]
pub struct ImageStore {
    images: Vec<CapturedImage>,
}

impl ImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the capture for the next expected direction
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` for a sentinel state, a duplicate or an
    /// out-of-order capture
    pub fn append(&mut self, image: CapturedImage) -> Result<()> {
        if image.state.direction() != Some(image.direction) {
            return Err(Error::InvalidTransition(format!(
                "Capture tagged {} cannot be stored as {}",
                image.state, image.direction
            )));
        }

        match Direction::ALL.get(self.images.len()) {
            Some(&expected) if expected == image.direction => {
                debug!("Stored {} capture ({}/{})", image.direction, self.images.len() + 1, Direction::ALL.len());
                self.images.push(image);
                Ok(())
            }
            Some(&expected) => Err(Error::InvalidTransition(format!(
                "Expected {expected} capture, got {}",
                image.direction
            ))),
            None => Err(Error::InvalidTransition(format!(
                "All directions already captured, got {}",
                image.direction
            ))),
        }
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// All five directions captured
    pub fn is_complete(&self) -> bool {
        self.images.len() == Direction::ALL.len()
    }

    pub fn images(&self) -> &[CapturedImage] {
        &self.images
    }

    /// Stored image for `direction`, if any
    pub fn image(&self, direction: Direction) -> Option<&CapturedImage> {
        self.images.iter().find(|img| img.direction == direction)
    }

    /// Directions without a usable image, in canonical order
    ///
    /// An entry whose data is not a JPEG data URI counts as missing.
    pub fn missing_directions(&self) -> Vec<Direction> {
        Direction::ALL
            .into_iter()
            .filter(|d| match self.image(*d) {
                Some(img) if is_image_data_uri(&img.image_data) => false,
                Some(_) => {
                    warn!("Capture for {d} is not a JPEG data URI");
                    true
                }
                None => true,
            })
            .collect()
    }

    /// Build the registration payload
    ///
    /// # Errors
    ///
    /// Returns `MissingDirections` naming every absent direction; a partial
    /// map is never produced
    pub fn to_direction_map(&self) -> Result<DirectionMap> {
        let missing = self.missing_directions();
        if !missing.is_empty() {
            return Err(Error::MissingDirections(missing));
        }

        let take = |direction: Direction| {
            self.image(direction)
                .map(|img| img.image_data.clone())
                .ok_or_else(|| Error::MissingDirections(vec![direction]))
        };

        Ok(DirectionMap {
            front: take(Direction::Front)?,
            left: take(Direction::Left)?,
            right: take(Direction::Right)?,
            up: take(Direction::Up)?,
            down: take(Direction::Down)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::JPEG_DATA_URI_PREFIX;

    fn capture(direction: Direction) -> CapturedImage {
        CapturedImage::new(direction, format!("{JPEG_DATA_URI_PREFIX}{direction}"))
    }

    fn full_store() -> ImageStore {
        let mut store = ImageStore::new();
        for direction in Direction::ALL {
            store.append(capture(direction)).unwrap();
        }
        store
    }

    #[test]
    fn test_append_in_order() {
        let store = full_store();
        assert!(store.is_complete());
        let states: Vec<_> = store.images().iter().map(|img| img.state).collect();
        assert_eq!(
            states,
            vec![PoseTarget::Front, PoseTarget::Left, PoseTarget::Right, PoseTarget::Up, PoseTarget::Down]
        );
    }

    #[test]
    fn test_rejects_out_of_order_and_duplicates() {
        let mut store = ImageStore::new();
        assert!(matches!(store.append(capture(Direction::Left)), Err(Error::InvalidTransition(_))));
        store.append(capture(Direction::Front)).unwrap();
        assert!(matches!(store.append(capture(Direction::Front)), Err(Error::InvalidTransition(_))));
        assert_eq!(store.len(), 1);

        let mut full = full_store();
        assert!(full.append(capture(Direction::Down)).is_err());
    }

    #[test]
    fn test_rejects_mismatched_state() {
        let mut store = ImageStore::new();
        let mut image = capture(Direction::Front);
        image.state = PoseTarget::Init;
        assert!(store.append(image).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_missing_directions_for_partial_store() {
        let mut store = ImageStore::new();
        store.append(capture(Direction::Front)).unwrap();
        store.append(capture(Direction::Left)).unwrap();

        match store.to_direction_map() {
            Err(Error::MissingDirections(missing)) => {
                assert_eq!(missing, vec![Direction::Right, Direction::Up, Direction::Down]);
            }
            other => panic!("expected MissingDirections, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_entry_counts_as_missing() {
        let mut store = ImageStore::new();
        for direction in Direction::ALL {
            let data = if direction == Direction::Up {
                "front.jpg".to_string()
            } else {
                format!("{JPEG_DATA_URI_PREFIX}{direction}")
            };
            store.append(CapturedImage::new(direction, data)).unwrap();
        }
        assert_eq!(store.missing_directions(), vec![Direction::Up]);
        assert!(store.to_direction_map().is_err());
    }

    #[test]
    fn test_direction_map_serializes_with_lowercase_keys() {
        let map = full_store().to_direction_map().unwrap();
        let json = serde_json::to_value(&map).unwrap();
        for direction in Direction::ALL {
            assert_eq!(json[direction.as_str()], map.get(direction));
        }
        let order: Vec<_> = map.iter().map(|(d, _)| d).collect();
        assert_eq!(order, Direction::ALL.to_vec());
    }

    #[test]
    fn test_clear() {
        let mut store = full_store();
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.missing_directions().len(), 5);
    }
}
