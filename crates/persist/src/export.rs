use cosmos_kernel::Universe;
use std::io::Write;

use crate::store::PersistError;

/// Write the whole universe as a pretty-printed JSON catalogue.
pub fn export_json<W: Write>(universe: &Universe, writer: W) -> Result<(), PersistError> {
    let _span = tracing::info_span!("export_json", galaxies = universe.galaxies().len()).entered();
    serde_json::to_writer_pretty(writer, universe)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmos_kernel::GenerationConfig;

    #[test]
    fn export_is_parseable_and_complete() {
        let universe = Universe::generate(5, GenerationConfig::small()).unwrap();
        let mut buf = Vec::new();
        export_json(&universe, &mut buf).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["seed"], 5);
        let galaxies = value["galaxies"].as_array().unwrap();
        assert_eq!(galaxies.len(), 3);
        assert_eq!(galaxies[0]["code"], "G0");
        assert_eq!(galaxies[1]["stars"][0]["code"], "G1-S0");

        let asteroid = &galaxies[0]["asteroids"][0]["composition"];
        assert!(asteroid.get("fractions").is_none());
        let names = [
            "Iron", "Silicon", "Magnesium", "Oxygen", "Carbon", "Nickel", "Sulfur", "Aluminum",
        ];
        let total: f64 = names
            .iter()
            .map(|name| asteroid[*name].as_f64().unwrap())
            .sum();
        assert!((total - 1.0).abs() < 1e-9);

        let back: Universe = serde_json::from_slice(&buf).unwrap();
        let (a, b) = (back.stats(), universe.stats());
        assert_eq!(a.total_objects(), b.total_objects());
        assert_eq!(a.inhabited_planets, b.inhabited_planets);
    }
}
