//! The OME metadata schema as static tables.
//!
//! Every leaf field of the OME document is declared once here, mapping its
//! logical key (the name used in data-file headers and on the command line)
//! to its root-first element path. Repeating groups are declared the same way
//! with their allowed entries and identifier fields.
//!
//! The tables are turned into shared [`ElementPath`]s once, on first use, by
//! [`schema()`]. Fields under the same parent share the parent's path node.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use crate::model::{ElementPath, RecordShape};

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// One leaf field of the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    /// Logical key, lower snake case (`platform_type`).
    pub key: &'static str,
    /// Element path, root-first.
    pub path: &'static [&'static str],
}

/// One repeating group of composite records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GroupSpec {
    /// Logical key (`investigator`).
    pub key: &'static str,
    /// Path of each record element, root-first.
    pub path: &'static [&'static str],
    /// Allowed entry names, in output order.
    pub entries: &'static [&'static str],
    /// Entries that identify a record, in identity-key order.
    pub identifiers: &'static [&'static str],
}

const fn field(key: &'static str, path: &'static [&'static str]) -> FieldSpec {
    FieldSpec { key, path }
}

/// The cruise identity field (the EXPO code).
pub const CRUISE_ID: FieldSpec = field(
    "cruise_id",
    &["Cruise_Info", "Experiment", "Cruise", "Cruise_ID"],
);

/// Alternative header key for [`CRUISE_ID`].
pub const EXPOCODE_ALIAS: &str = "expocode";

/// Every non-identity scalar field, in document order.
pub const SCALAR_FIELDS: &[FieldSpec] = &[
    // <User>
    field("user_name", &["User", "Name"]),
    field("user_organization", &["User", "Organization"]),
    field("user_address", &["User", "Address"]),
    field("user_phone", &["User", "Phone"]),
    field("user_email", &["User", "Email"]),
    // <Dataset_Info>
    field("dataset_id", &["Dataset_Info", "Dataset_ID"]),
    field("funding_info", &["Dataset_Info", "Funding_Info"]),
    field("initial_submission", &["Dataset_Info", "Submission_Dates", "Initial_Submission"]),
    field("revised_submission", &["Dataset_Info", "Submission_Dates", "Revised_Submission"]),
    // <Cruise_Info><Experiment>
    field("experiment_name", &["Cruise_Info", "Experiment", "Experiment_Name"]),
    field("experiment_type", &["Cruise_Info", "Experiment", "Experiment_Type"]),
    field("platform_type", &["Cruise_Info", "Experiment", "Platform_Type"]),
    field("co2_instrument_type", &["Cruise_Info", "Experiment", "Co2_Instrument_type"]),
    field("mooring_id", &["Cruise_Info", "Experiment", "Mooring_ID"]),
    // <Cruise_Info><Experiment><Cruise>
    field("cruise_info", &["Cruise_Info", "Experiment", "Cruise", "Cruise_Info"]),
    field("section", &["Cruise_Info", "Experiment", "Cruise", "Section"]),
    field(
        "geographical_region",
        &["Cruise_Info", "Experiment", "Cruise", "Geographical_Coverage", "Geographical_Region"],
    ),
    field(
        "westernmost_longitude",
        &["Cruise_Info", "Experiment", "Cruise", "Geographical_Coverage", "Bounds", "Westernmost_Longitude"],
    ),
    field(
        "easternmost_longitude",
        &["Cruise_Info", "Experiment", "Cruise", "Geographical_Coverage", "Bounds", "Easternmost_Longitude"],
    ),
    field(
        "northernmost_latitude",
        &["Cruise_Info", "Experiment", "Cruise", "Geographical_Coverage", "Bounds", "Northernmost_Latitude"],
    ),
    field(
        "southernmost_latitude",
        &["Cruise_Info", "Experiment", "Cruise", "Geographical_Coverage", "Bounds", "Southernmost_Latitude"],
    ),
    field(
        "temporal_coverage_start_date",
        &["Cruise_Info", "Experiment", "Cruise", "Temporal_Coverage", "Start_Date"],
    ),
    field(
        "temporal_coverage_end_date",
        &["Cruise_Info", "Experiment", "Cruise", "Temporal_Coverage", "End_Date"],
    ),
    field("cruise_start_date", &["Cruise_Info", "Experiment", "Cruise", "Start_Date"]),
    field("cruise_end_date", &["Cruise_Info", "Experiment", "Cruise", "End_Date"]),
    // <Cruise_Info><Vessel>
    field("vessel_name", &["Cruise_Info", "Vessel", "Vessel_Name"]),
    field("vessel_id", &["Cruise_Info", "Vessel", "Vessel_ID"]),
    field("country", &["Cruise_Info", "Vessel", "Country"]),
    field("vessel_owner", &["Cruise_Info", "Vessel", "Vessel_Owner"]),
    // <CO2_Data_Info><...><Unit>
    field("xco2_water_equ_dry_unit", &["CO2_Data_Info", "xCO2water_equ_dry", "Unit"]),
    field("xco2_water_sst_dry_unit", &["CO2_Data_Info", "xCO2water_SST_dry", "Unit"]),
    field("pco2_water_equ_wet_unit", &["CO2_Data_Info", "pCO2water_equ_wet", "Unit"]),
    field("pco2_water_sst_wet_unit", &["CO2_Data_Info", "pCO2water_SST_wet", "Unit"]),
    field("fco2_water_equ_wet_unit", &["CO2_Data_Info", "fCO2water_equ_wet", "Unit"]),
    field("fco2_water_sst_wet_unit", &["CO2_Data_Info", "fCO2water_SST_wet", "Unit"]),
    field("xco2_air_dry_unit", &["CO2_Data_Info", "xCO2air_dry", "Unit"]),
    field("pco2_air_wet_unit", &["CO2_Data_Info", "pCO2air_wet", "Unit"]),
    field("fco2_air_wet_unit", &["CO2_Data_Info", "fCO2air_wet", "Unit"]),
    field("xco2_air_dry_interpolated_unit", &["CO2_Data_Info", "xCO2air_dry_interpolated", "Unit"]),
    field("pco2_air_wet_interpolated_unit", &["CO2_Data_Info", "pCO2air_wet_interpolated", "Unit"]),
    field("fco2_air_wet_interpolated_unit", &["CO2_Data_Info", "fCO2air_wet_interpolated", "Unit"]),
    // <Method_Description><Equilibrator_Design>
    field("depth_of_seawater_intake", &["Method_Description", "Equilibrator_Design", "Depth_of_Sea_Water_Intake"]),
    field("location_of_seawater_intake", &["Method_Description", "Equilibrator_Design", "Location_of_Sea_Water_Intake"]),
    field("equilibrator_type", &["Method_Description", "Equilibrator_Design", "Equilibrator_Type"]),
    field("equilibrator_volume", &["Method_Description", "Equilibrator_Design", "Equilibrator_Volume"]),
    field("water_flow_rate", &["Method_Description", "Equilibrator_Design", "Water_Flow_Rate"]),
    field("headspace_gas_flow_rate", &["Method_Description", "Equilibrator_Design", "Headspace_Gas_Flow_Rate"]),
    field("vented", &["Method_Description", "Equilibrator_Design", "Vented"]),
    field(
        "drying_method_for_co2_in_water",
        &["Method_Description", "Equilibrator_Design", "Drying_Method_for_CO2_in_water"],
    ),
    field(
        "equilibrator_additional_information",
        &["Method_Description", "Equilibrator_Design", "Additional_Information"],
    ),
    // <Method_Description><CO2_in_Marine_Air>
    field("co2_in_marine_air_measurement", &["Method_Description", "CO2_in_Marine_Air", "Measurement"]),
    field(
        "co2_in_marine_air_location_and_height",
        &["Method_Description", "CO2_in_Marine_Air", "Location_and_Height"],
    ),
    field("co2_in_marine_air_drying_method", &["Method_Description", "CO2_in_Marine_Air", "Drying_Method"]),
    // <Method_Description><CO2_Sensors><CO2_Sensor>
    field("co2_measurement_method", &["Method_Description", "CO2_Sensors", "CO2_Sensor", "Measurement_Method"]),
    field("co2_manufacturer", &["Method_Description", "CO2_Sensors", "CO2_Sensor", "Manufacturer"]),
    field("co2_model", &["Method_Description", "CO2_Sensors", "CO2_Sensor", "Model"]),
    field("co2_frequency", &["Method_Description", "CO2_Sensors", "CO2_Sensor", "Frequency"]),
    field("co2_resolution_water", &["Method_Description", "CO2_Sensors", "CO2_Sensor", "Resolution_Water"]),
    field("co2_uncertainty_water", &["Method_Description", "CO2_Sensors", "CO2_Sensor", "Uncertainty_Water"]),
    field("co2_resolution_air", &["Method_Description", "CO2_Sensors", "CO2_Sensor", "Resolution_Air"]),
    field("co2_uncertainty_air", &["Method_Description", "CO2_Sensors", "CO2_Sensor", "Uncertainty_Air"]),
    field(
        "co2_manufacturer_of_calibration_gas",
        &["Method_Description", "CO2_Sensors", "CO2_Sensor", "Manufacturer_of_Calibration_Gas"],
    ),
    field(
        "co2_sensor_calibration",
        &["Method_Description", "CO2_Sensors", "CO2_Sensor", "CO2_Sensor_Calibration"],
    ),
    field(
        "co2_environmental_control",
        &["Method_Description", "CO2_Sensors", "CO2_Sensor", "Environmental_Control"],
    ),
    field("co2_method_references", &["Method_Description", "CO2_Sensors", "CO2_Sensor", "Method_References"]),
    field("details_of_co2_sensing", &["Method_Description", "CO2_Sensors", "CO2_Sensor", "Details_Co2_Sensing"]),
    field(
        "analysis_of_co2_comparison",
        &["Method_Description", "CO2_Sensors", "CO2_Sensor", "Analysis_of_Co2_Comparision"],
    ),
    field("measured_co2_params", &["Method_Description", "CO2_Sensors", "CO2_Sensor", "Measured_Co2_Params"]),
    // <Method_Description><Sea_Surface_Temperature>
    field("sst_location", &["Method_Description", "Sea_Surface_Temperature", "Location"]),
    field("sst_manufacturer", &["Method_Description", "Sea_Surface_Temperature", "Manufacturer"]),
    field("sst_model", &["Method_Description", "Sea_Surface_Temperature", "Model"]),
    field("sst_accuracy", &["Method_Description", "Sea_Surface_Temperature", "Accuracy"]),
    field("sst_precision", &["Method_Description", "Sea_Surface_Temperature", "Precision"]),
    field("sst_calibration", &["Method_Description", "Sea_Surface_Temperature", "Calibration"]),
    field("sst_other_comments", &["Method_Description", "Sea_Surface_Temperature", "Other_Comments"]),
    // <Method_Description><Equilibrator_Temperature>
    field("equ_temperature_location", &["Method_Description", "Equilibrator_Temperature", "Location"]),
    field("equ_temperature_manufacturer", &["Method_Description", "Equilibrator_Temperature", "Manufacturer"]),
    field("equ_temperature_model", &["Method_Description", "Equilibrator_Temperature", "Model"]),
    field("equ_temperature_accuracy", &["Method_Description", "Equilibrator_Temperature", "Accuracy"]),
    field("equ_temperature_precision", &["Method_Description", "Equilibrator_Temperature", "Precision"]),
    field("equ_temperature_calibration", &["Method_Description", "Equilibrator_Temperature", "Calibration"]),
    field("equ_temperature_warming", &["Method_Description", "Equilibrator_Temperature", "Warming"]),
    field("equ_temperature_other_comments", &["Method_Description", "Equilibrator_Temperature", "Other_Comments"]),
    // <Method_Description><Equilibrator_Pressure>
    field("equ_pressure_location", &["Method_Description", "Equilibrator_Pressure", "Location"]),
    field("equ_pressure_manufacturer", &["Method_Description", "Equilibrator_Pressure", "Manufacturer"]),
    field("equ_pressure_model", &["Method_Description", "Equilibrator_Pressure", "Model"]),
    field("equ_pressure_accuracy", &["Method_Description", "Equilibrator_Pressure", "Accuracy"]),
    field("equ_pressure_precision", &["Method_Description", "Equilibrator_Pressure", "Precision"]),
    field("equ_pressure_calibration", &["Method_Description", "Equilibrator_Pressure", "Calibration"]),
    field("equ_pressure_other_comments", &["Method_Description", "Equilibrator_Pressure", "Other_Comments"]),
    field("equ_pressure_normalized", &["Method_Description", "Equilibrator_Pressure", "Normalized"]),
    // <Method_Description><Atmospheric_Pressure>
    field("atm_pressure_location", &["Method_Description", "Atmospheric_Pressure", "Location"]),
    field("atm_pressure_manufacturer", &["Method_Description", "Atmospheric_Pressure", "Manufacturer"]),
    field("atm_pressure_model", &["Method_Description", "Atmospheric_Pressure", "Model"]),
    field("atm_pressure_accuracy", &["Method_Description", "Atmospheric_Pressure", "Accuracy"]),
    field("atm_pressure_precision", &["Method_Description", "Atmospheric_Pressure", "Precision"]),
    field("atm_pressure_calibration", &["Method_Description", "Atmospheric_Pressure", "Calibration"]),
    field("atm_pressure_other_comments", &["Method_Description", "Atmospheric_Pressure", "Other_Comments"]),
    // <Method_Description><Sea_Surface_Salinity>
    field("sss_location", &["Method_Description", "Sea_Surface_Salinity", "Location"]),
    field("sss_manufacturer", &["Method_Description", "Sea_Surface_Salinity", "Manufacturer"]),
    field("sss_model", &["Method_Description", "Sea_Surface_Salinity", "Model"]),
    field("sss_accuracy", &["Method_Description", "Sea_Surface_Salinity", "Accuracy"]),
    field("sss_precision", &["Method_Description", "Sea_Surface_Salinity", "Precision"]),
    field("sss_calibration", &["Method_Description", "Sea_Surface_Salinity", "Calibration"]),
    field("sss_other_comments", &["Method_Description", "Sea_Surface_Salinity", "Other_Comments"]),
    // root level
    field("data_set_references", &["Data_set_References"]),
    field("additional_information", &["Additional_Information"]),
    field("citation", &["Citation"]),
    field("measurement_and_calibration_report", &["Measurement_and_Calibration_Report"]),
    field("preliminary_quality_control", &["Preliminary_Quality_control"]),
    field("form_type", &["form_type"]),
    field("record_id", &["record_id"]),
];

/// Every repeating group, in document order.
pub const RECORD_GROUPS: &[GroupSpec] = &[
    GroupSpec {
        key: "investigator",
        path: &["Investigator"],
        entries: &["name", "organization", "address", "phone", "email"],
        identifiers: &["name", "email"],
    },
    GroupSpec {
        key: "variable",
        path: &["Variables_Info", "Variable"],
        entries: &["variable_name", "description_of_variable"],
        identifiers: &["variable_name"],
    },
    GroupSpec {
        key: "other_sensor",
        path: &["Method_Description", "Other_Sensors", "Sensor"],
        entries: &[
            "manufacturer",
            "model",
            "accuracy",
            "resolution",
            "calibration",
            "other_comments",
        ],
        identifiers: &["manufacturer", "model"],
    },
];

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// The declarations resolved into shared paths and record shapes.
#[derive(Debug)]
pub struct Schema {
    cruise_id: ElementPath,
    fields: Vec<ElementPath>,
    shapes: Vec<Arc<RecordShape>>,
}

static SCHEMA: LazyLock<Schema> = LazyLock::new(Schema::build);

/// The process-wide schema, built on first use.
#[must_use]
pub fn schema() -> &'static Schema {
    &SCHEMA
}

impl Schema {
    fn build() -> Self {
        let mut interner = PathInterner::default();
        let cruise_id = interner.intern(CRUISE_ID.path);
        let fields = SCALAR_FIELDS
            .iter()
            .map(|spec| interner.intern(spec.path))
            .collect();
        let shapes = RECORD_GROUPS
            .iter()
            .map(|spec| Arc::new(shape_for(spec, interner.intern(spec.path))))
            .collect();
        Self {
            cruise_id,
            fields,
            shapes,
        }
    }

    #[must_use]
    pub const fn cruise_id_path(&self) -> &ElementPath {
        &self.cruise_id
    }

    /// Path of the scalar field at `index` in [`SCALAR_FIELDS`].
    #[must_use]
    pub fn field_path(&self, index: usize) -> Option<&ElementPath> {
        self.fields.get(index)
    }

    /// Shared shape of the group at `index` in [`RECORD_GROUPS`].
    #[must_use]
    pub fn shape(&self, index: usize) -> Option<&Arc<RecordShape>> {
        self.shapes.get(index)
    }
}

fn shape_for(spec: &GroupSpec, path: ElementPath) -> RecordShape {
    RecordShape::declared(path, spec.identifiers, spec.entries)
}

/// Builds paths so that equal prefixes share one node.
#[derive(Default)]
struct PathInterner {
    nodes: BTreeMap<Vec<&'static str>, ElementPath>,
}

impl PathInterner {
    fn intern(&mut self, segments: &[&'static str]) -> ElementPath {
        if let Some(path) = self.nodes.get(segments) {
            return path.clone();
        }
        let path = match segments.split_last() {
            Some((name, [])) => ElementPath::root(*name),
            Some((name, parent)) => self.intern(parent).child(*name),
            None => ElementPath::root(""),
        };
        self.nodes.insert(segments.to_vec(), path.clone());
        path
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Where a logical key points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldRef {
    /// The cruise identity field.
    CruiseId,
    /// Index into [`SCALAR_FIELDS`].
    Scalar(usize),
}

/// Resolve a field key (case-insensitive; `expocode` is an alias of
/// `cruise_id`).
#[must_use]
pub fn lookup_field(key: &str) -> Option<FieldRef> {
    let key = key.trim();
    if key.eq_ignore_ascii_case(CRUISE_ID.key) || key.eq_ignore_ascii_case(EXPOCODE_ALIAS) {
        return Some(FieldRef::CruiseId);
    }
    SCALAR_FIELDS
        .iter()
        .position(|spec| spec.key.eq_ignore_ascii_case(key))
        .map(FieldRef::Scalar)
}

/// Resolve a group key (case-insensitive) to its index in [`RECORD_GROUPS`].
#[must_use]
pub fn lookup_group(key: &str) -> Option<usize> {
    let key = key.trim();
    RECORD_GROUPS
        .iter()
        .position(|spec| spec.key.eq_ignore_ascii_case(key))
}

/// `true` if `key` names a field or the cruise identity.
#[must_use]
pub fn is_field_key(key: &str) -> bool {
    lookup_field(key).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn keys_are_unique() {
        let mut seen = BTreeSet::new();
        assert!(seen.insert(CRUISE_ID.key));
        for spec in SCALAR_FIELDS {
            assert!(seen.insert(spec.key), "duplicate key {}", spec.key);
        }
        for spec in RECORD_GROUPS {
            assert!(seen.insert(spec.key), "group key clashes: {}", spec.key);
        }
    }

    #[test]
    fn paths_are_unique_and_never_nest() {
        let mut paths: Vec<&[&str]> = SCALAR_FIELDS.iter().map(|s| s.path).collect();
        paths.push(CRUISE_ID.path);
        paths.extend(RECORD_GROUPS.iter().map(|g| g.path));
        for (i, a) in paths.iter().enumerate() {
            for (j, b) in paths.iter().enumerate() {
                if i != j {
                    assert!(!b.starts_with(a), "{a:?} is a prefix of {b:?}");
                }
            }
        }
    }

    #[test]
    fn groups_identify_by_allowed_entries() {
        for spec in RECORD_GROUPS {
            assert!(!spec.identifiers.is_empty());
            for id in spec.identifiers {
                assert!(spec.entries.contains(id), "{} id {id} not an entry", spec.key);
            }
        }
    }

    #[test]
    fn schema_shares_prefix_nodes() {
        let s = schema();
        let platform = lookup_field("platform_type").unwrap();
        let name = lookup_field("experiment_name").unwrap();
        let (FieldRef::Scalar(a), FieldRef::Scalar(b)) = (platform, name) else {
            panic!("expected scalar fields");
        };
        let pa = s.field_path(a).unwrap();
        let pb = s.field_path(b).unwrap();
        assert!(pa.parent().unwrap().shares_node(pb.parent().unwrap()));
        assert_eq!(pa.to_string(), "Cruise_Info/Experiment/Platform_Type");
    }

    #[test]
    fn lookup_is_case_insensitive_with_expocode_alias() {
        assert_eq!(lookup_field("EXPOCODE"), Some(FieldRef::CruiseId));
        assert_eq!(lookup_field("Cruise_ID"), Some(FieldRef::CruiseId));
        assert!(matches!(lookup_field("Vessel_Name"), Some(FieldRef::Scalar(_))));
        assert_eq!(lookup_field("nonsense"), None);
        assert_eq!(lookup_group("Investigator"), Some(0));
        assert_eq!(lookup_group("sensor"), None);
    }

    #[test]
    fn shapes_follow_declarations() {
        let shape = schema().shape(0).unwrap();
        assert_eq!(shape.path().to_string(), "Investigator");
        assert_eq!(shape.identifiers(), ["name", "email"]);
        assert!(shape.allows("phone"));
        assert!(!shape.allows("fax"));
    }
}
