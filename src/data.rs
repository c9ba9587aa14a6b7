use crate::config::{BoundaryFields, InputConfig};
use crate::error::{DatasetKind, LoadError};
use crate::normalize::coerce_id;
use crate::types::{GeoFeature, RawRow};
use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use geojson::GeoJson;
use serde_json::Value;
use std::fs::File;
use std::future::Future;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{info, warn};

/// The three parsed inputs, before normalization.
#[derive(Debug, Clone, Default)]
pub struct RawInputs {
    pub features: Vec<GeoFeature>,
    pub density_rows: Vec<RawRow>,
    pub unemployment_rows: Vec<RawRow>,
}

pub fn read_boundaries<R: Read>(reader: R, fields: &BoundaryFields) -> Result<Vec<GeoFeature>> {
    let geojson = GeoJson::from_reader(reader).context("Failed to parse boundary GeoJSON")?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("Boundary GeoJSON must be a FeatureCollection")),
    };

    let mut features = Vec::with_capacity(collection.features.len());
    let mut skipped = 0usize;

    for feature in collection.features {
        let properties = feature.properties.unwrap_or_default();

        let id = match properties.get(&fields.id) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                skipped += 1;
                continue;
            }
        };

        let subdivision_type = properties
            .get(&fields.subdivision_type)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let region_code = properties.get(&fields.region_code).and_then(json_integer);
        let name = properties.get(&fields.name).and_then(Value::as_str).map(str::to_string);

        features.push(GeoFeature {
            id,
            subdivision_type,
            region_code,
            name,
            density: None,
            unemployment_rate: None,
            id2: None,
            properties,
            geometry: feature.geometry,
        });
    }

    if skipped > 0 {
        warn!(skipped, field = %fields.id, "boundary features without an identifier were skipped");
    }
    Ok(features)
}

// Region codes show up both as "17" and 17.
fn json_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => coerce_id(s),
        _ => None,
    }
}

/// Reads a delimited table with a header row. Short rows simply lack the trailing columns.
pub fn read_rows<R: Read>(reader: R, delimiter: u8) -> Result<Vec<RawRow>> {
    let mut rdr = ReaderBuilder::new().delimiter(delimiter).flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(
            headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.to_string(), v.to_string()))
                .collect(),
        );
    }
    Ok(rows)
}

pub fn load_boundaries(path: &Path, fields: &BoundaryFields) -> Result<Vec<GeoFeature>> {
    let file = File::open(path).with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
    let features = read_boundaries(BufReader::new(file), fields)?;
    info!(path = ?path, features = features.len(), "loaded boundaries");
    Ok(features)
}

pub fn load_rows(path: &Path, delimiter: u8) -> Result<Vec<RawRow>> {
    let file = File::open(path).with_context(|| format!("Failed to open table: {:?}", path))?;
    let rows = read_rows(BufReader::new(file), delimiter)
        .with_context(|| format!("Failed to parse table: {:?}", path))?;
    info!(path = ?path, rows = rows.len(), "loaded table");
    Ok(rows)
}

async fn tagged<T>(dataset: DatasetKind, load: impl Future<Output = Result<T>>) -> Result<T, LoadError> {
    load.await.map_err(|err| LoadError { dataset, source: err.into() })
}

/// Awaits the three loads concurrently. The first failure aborts the rendezvous
/// and names the dataset that failed.
pub async fn rendezvous<BF, DF, UF>(boundaries: BF, density: DF, unemployment: UF) -> Result<RawInputs, LoadError>
where
    BF: Future<Output = Result<Vec<GeoFeature>>>,
    DF: Future<Output = Result<Vec<RawRow>>>,
    UF: Future<Output = Result<Vec<RawRow>>>,
{
    let (features, density_rows, unemployment_rows) = tokio::try_join!(
        tagged(DatasetKind::Boundaries, boundaries),
        tagged(DatasetKind::Density, density),
        tagged(DatasetKind::Unemployment, unemployment),
    )?;
    Ok(RawInputs { features, density_rows, unemployment_rows })
}

async fn blocking<T, F>(task: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(task).await.context("Loader task did not complete")?
}

/// Loads boundaries, the density CSV and the unemployment TSV in parallel.
pub async fn load_inputs(input: &InputConfig) -> Result<RawInputs, LoadError> {
    let boundaries_path = input.boundaries.clone();
    let fields = input.boundary_fields.clone();
    let density_path = input.density_csv.clone();
    let unemployment_path = input.unemployment_tsv.clone();

    rendezvous(
        blocking(move || load_boundaries(&boundaries_path, &fields)),
        blocking(move || load_rows(&density_path, b',')),
        blocking(move || load_rows(&unemployment_path, b'\t')),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    const COUNTIES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature", "geometry": null,
              "properties": { "GEO_ID": "0500000US17001", "STATE": "17", "LSAD": "County", "NAME": "Adams" } },
            { "type": "Feature", "geometry": { "type": "Point", "coordinates": [-91.2, 39.9] },
              "properties": { "GEO_ID": "0500000US05001", "STATE": 5, "LSAD": "County", "NAME": "Arkansas", "CENSUSAREA": 988.76 } },
            { "type": "Feature", "geometry": null,
              "properties": { "STATE": "17", "LSAD": "County" } }
        ]
    }"#;

    #[test]
    fn boundaries_keep_ids_regions_and_extra_properties() {
        let features = read_boundaries(Cursor::new(COUNTIES), &BoundaryFields::default()).unwrap();

        assert_eq!(features.len(), 2);
        assert_eq!(features[0].id, "0500000US17001");
        assert_eq!(features[0].region_code, Some(17));
        assert_eq!(features[0].name.as_deref(), Some("Adams"));
        assert_eq!(features[1].region_code, Some(5));
        assert!(features[1].properties.contains_key("CENSUSAREA"));
        assert!(features[1].geometry.is_some());
    }

    #[test]
    fn boundaries_must_be_a_collection() {
        let single = r#"{ "type": "Feature", "geometry": null, "properties": {} }"#;
        let err = read_boundaries(Cursor::new(single), &BoundaryFields::default()).unwrap_err();
        assert!(err.to_string().contains("FeatureCollection"));
    }

    #[test]
    fn tsv_rows_map_headers_to_cells() {
        let rows = read_rows(Cursor::new("id\trate\n1001\t.097\n1003\n"), b'\t').unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["rate"], ".097");
        assert_eq!(rows[1].get("rate"), None);
    }

    #[tokio::test]
    async fn rendezvous_collects_all_three() {
        let inputs = rendezvous(
            async { Ok::<_, anyhow::Error>(vec![GeoFeature::new("A", "County", 17)]) },
            async { read_rows(Cursor::new("GCT_STUB.target-geo-id,Density\nA,100\n"), b',') },
            async { Ok::<_, anyhow::Error>(Vec::new()) },
        )
        .await
        .unwrap();

        assert_eq!(inputs.features.len(), 1);
        assert_eq!(inputs.density_rows.len(), 1);
        assert!(inputs.unemployment_rows.is_empty());
    }

    #[tokio::test]
    async fn rendezvous_names_the_failing_load() {
        let err = rendezvous(
            async { Ok::<_, anyhow::Error>(Vec::new()) },
            async { Ok::<_, anyhow::Error>(Vec::new()) },
            async { Err::<Vec<RawRow>, _>(anyhow!("connection reset")) },
        )
        .await
        .unwrap_err();

        assert_eq!(err.dataset, DatasetKind::Unemployment);
        assert_eq!(err.to_string(), "failed to load unemployment dataset");
        assert_eq!(err.source.to_string(), "connection reset");
    }

    #[tokio::test]
    async fn missing_file_fails_whole_load() {
        let input = InputConfig {
            boundaries: PathBuf::from("/nonexistent/counties_data.json"),
            density_csv: PathBuf::from("/nonexistent/pop-dense.csv"),
            unemployment_tsv: PathBuf::from("/nonexistent/unemployment.tsv"),
            ..InputConfig::default()
        };
        let err = load_inputs(&input).await.unwrap_err();
        let cause = err.source.to_string();
        assert!(cause.starts_with("Failed to open"), "{cause}");
    }
}
