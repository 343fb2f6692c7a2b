// Loading of the feature database, a JSON array of
// {"location": {"latitude", "longitude"}, "name"} records.
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::ClientError;
use crate::routeguide::{Feature, Point};

#[derive(Debug, Deserialize)]
struct Location {
    latitude: i32,
    longitude: i32,
}

#[derive(Debug, Deserialize)]
struct DataFeature {
    location: Location,
    #[serde(default)]
    name: String,
}

impl From<DataFeature> for Feature {
    fn from(feature: DataFeature) -> Self {
        Feature {
            name: feature.name,
            location: Some(Point::new(
                feature.location.latitude,
                feature.location.longitude,
            )),
        }
    }
}

/// Reads the feature database at `path`. Order is preserved.
pub fn load_features(path: impl AsRef<Path>) -> Result<Vec<Feature>, ClientError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ClientError::ReadData {
        path: path.to_path_buf(),
        source,
    })?;

    let features = parse_features(BufReader::new(file))?;
    debug!(path = %path.display(), count = features.len(), "Loaded features");
    Ok(features)
}

pub fn parse_features<R: Read>(reader: R) -> Result<Vec<Feature>, ClientError> {
    let decoded: Vec<DataFeature> = serde_json::from_reader(reader)?;
    Ok(decoded.into_iter().map(Feature::from).collect())
}
