/// Per-country constants for one testing-data feed. The same pipeline runs
/// for every country; only this record changes.
#[derive(Debug, Clone)]
pub struct CountryConfig {
    /// Value of the `Country` output column; also names the output file.
    pub location: &'static str,
    /// Value of the `Units` output column.
    pub units: &'static str,
    /// Value of the `Notes` output column; `None` serializes as empty.
    pub notes: Option<&'static str>,
    /// URL of the ZIP-compressed CSV the pipeline downloads.
    pub source_url: &'static str,
    /// Public dataset page published in the `Source URL` column. Not the
    /// download URL.
    pub source_url_ref: &'static str,
    /// Value of the `Source label` output column.
    pub source_label: &'static str,
}

/// The Argentina feed: per-lab-submission determination counts published by
/// the national health ministry (SISA).
pub fn argentina() -> CountryConfig {
    CountryConfig {
        location: "Argentina",
        units: "tests performed",
        notes: None,
        source_url: "https://sisa.msal.gov.ar/datos/descargas/covid-19/files/Covid19Determinaciones.zip",
        source_url_ref: "https://datos.gob.ar/dataset/salud-covid-19-determinaciones-registradas-republica-argentina/archivo/salud_0de942d4-d106-4c74-b6b2-3654b0c53a3a",
        source_label: "Government of Argentina",
    }
}
