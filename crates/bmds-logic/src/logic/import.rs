use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::diagnostics::{ModelDiagnostics, NamedDiagnostics};

/// Errors raised while reading diagnostics exported by the fitting engine.
#[derive(Debug, thiserror::Error)]
pub enum DiagnosticsImportError {
    #[error("failed to read diagnostics export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid diagnostics CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid diagnostics JSON data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("diagnostics row {row} has no model name")]
    MissingName { row: usize },
}

/// Loads per-model diagnostics from CSV (one row per model) or JSON exports.
pub struct DiagnosticsImporter;

impl DiagnosticsImporter {
    /// Reads a file, choosing the format from its extension (`.json`, otherwise CSV).
    pub fn from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Vec<NamedDiagnostics>, DiagnosticsImportError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_json_reader(file)
        } else {
            Self::from_csv_reader(file)
        }
    }

    pub fn from_json_reader<R: Read>(
        reader: R,
    ) -> Result<Vec<NamedDiagnostics>, DiagnosticsImportError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_csv_reader<R: Read>(
        reader: R,
    ) -> Result<Vec<NamedDiagnostics>, DiagnosticsImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut models = Vec::new();

        for (index, record) in csv_reader.deserialize::<DiagnosticsRow>().enumerate() {
            let row = record?;
            let name = row.model.trim().to_string();
            if name.is_empty() {
                return Err(DiagnosticsImportError::MissingName { row: index + 1 });
            }
            models.push(NamedDiagnostics {
                name,
                diagnostics: row.into_diagnostics(),
            });
        }

        tracing::debug!(models = models.len(), "imported diagnostics from csv");
        Ok(models)
    }
}

#[derive(Debug, Deserialize)]
struct DiagnosticsRow {
    model: String,
    #[serde(default)]
    converged: Option<bool>,
    #[serde(default)]
    aic: Option<f64>,
    #[serde(default)]
    log_posterior: Option<f64>,
    #[serde(default)]
    gof_p_value: Option<f64>,
    #[serde(default)]
    degrees_of_freedom: Option<f64>,
    #[serde(default)]
    bmd: Option<f64>,
    #[serde(default)]
    bmdl: Option<f64>,
    #[serde(default)]
    bmdu: Option<f64>,
    #[serde(default)]
    max_dose: Option<f64>,
    #[serde(default)]
    min_nonzero_dose: Option<f64>,
    #[serde(default)]
    residual_near_bmd: Option<f64>,
    #[serde(default)]
    residual_at_control: Option<f64>,
    #[serde(default)]
    control_stdev_modeled: Option<f64>,
    #[serde(default)]
    control_stdev_observed: Option<f64>,
    #[serde(default)]
    variance_p_value: Option<f64>,
    #[serde(default)]
    constant_variance_adequate: Option<bool>,
}

impl DiagnosticsRow {
    fn into_diagnostics(self) -> ModelDiagnostics {
        ModelDiagnostics {
            converged: self.converged,
            aic: self.aic,
            log_posterior: self.log_posterior,
            gof_p_value: self.gof_p_value,
            degrees_of_freedom: self.degrees_of_freedom,
            bmd: self.bmd,
            bmdl: self.bmdl,
            bmdu: self.bmdu,
            max_dose: self.max_dose,
            min_nonzero_dose: self.min_nonzero_dose,
            residual_near_bmd: self.residual_near_bmd,
            residual_at_control: self.residual_at_control,
            control_stdev_modeled: self.control_stdev_modeled,
            control_stdev_observed: self.control_stdev_observed,
            variance_p_value: self.variance_p_value,
            constant_variance_adequate: self.constant_variance_adequate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn csv_rows_map_blank_cells_to_missing_values() {
        let csv = "\
model,converged,gof_p_value,degrees_of_freedom,bmd,bmdl,residual_near_bmd
Linear,true,0.42,2,12.5,8.1,0.3
Hill,false,,0,,,
";
        let models =
            DiagnosticsImporter::from_csv_reader(Cursor::new(csv)).expect("csv parses");

        assert_eq!(models.len(), 2);
        assert_eq!(models[0].name, "Linear");
        assert_eq!(models[0].diagnostics.gof_p_value, Some(0.42));
        assert_eq!(models[0].diagnostics.bmdl, Some(8.1));
        assert_eq!(models[1].diagnostics.converged, Some(false));
        assert_eq!(models[1].diagnostics.bmd, None);
        assert_eq!(models[1].diagnostics.aic, None);
    }

    #[test]
    fn csv_rows_require_a_model_name() {
        let csv = "model,bmd\n,1.0\n";
        match DiagnosticsImporter::from_csv_reader(Cursor::new(csv)) {
            Err(DiagnosticsImportError::MissingName { row: 1 }) => {}
            other => panic!("expected missing name error, got {other:?}"),
        }
    }

    #[test]
    fn json_exports_parse_named_diagnostics() {
        let json = r#"[{"name": "Exponential-M3", "diagnostics": {"bmd": 4.2, "converged": true}}]"#;
        let models =
            DiagnosticsImporter::from_json_reader(Cursor::new(json)).expect("json parses");
        assert_eq!(models[0].name, "Exponential-M3");
        assert_eq!(models[0].diagnostics.bmd, Some(4.2));
        assert_eq!(models[0].diagnostics.gof_p_value, None);
    }
}
