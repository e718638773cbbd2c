/// Sensor catalog of the Nano 33 BLE firmwares and enable-list filtering
use log::debug;

use crate::codec::FieldType::{Int16, UInt16};
use crate::errors::EngineError;
use crate::schema::{Capability, CharacteristicSchema, FieldSpec};

/// Primary GATT service advertised by every firmware
pub const SERVICE_UUID: &str = "d91cb6ee-d174-11ea-87d0-0242ac130003";

const NOTIFY: &[Capability] = &[Capability::Notify];
const WRITE: &[Capability] = &[Capability::Write];
const NOTIFY_WRITE: &[Capability] = &[Capability::Notify, Capability::Write];
const READ_WRITE: &[Capability] = &[Capability::Read, Capability::Write];

const fn xyz(names: [&'static str; 3]) -> [FieldSpec; 3] {
    [
        FieldSpec::new(Int16, names[0]),
        FieldSpec::new(Int16, names[1]),
        FieldSpec::new(Int16, names[2]),
    ]
}

const fn rgb(names: [&'static str; 3]) -> [FieldSpec; 3] {
    [
        FieldSpec::new(UInt16, names[0]),
        FieldSpec::new(UInt16, names[1]),
        FieldSpec::new(UInt16, names[2]),
    ]
}

/// Every characteristic known for this peripheral family
///
/// Cor boards use the `1xxx`/`3xxx` UUID ranges, Bol boards `2xxx`/`4xxx`.
pub static CATALOG: &[CharacteristicSchema] = &[
    CharacteristicSchema {
        id: "CorAccelerometer",
        uuid: "d91cb6ee-1002-11ea-87d0-0242ac130003",
        capabilities: NOTIFY,
        fields: &xyz(["cax", "cay", "caz"]),
    },
    CharacteristicSchema {
        id: "CorGyroscope",
        uuid: "d91cb6ee-1003-11ea-87d0-0242ac130003",
        capabilities: NOTIFY,
        fields: &xyz(["cgx", "cgy", "cgz"]),
    },
    CharacteristicSchema {
        id: "CorMagnetometer",
        uuid: "d91cb6ee-1004-11ea-87d0-0242ac130003",
        capabilities: NOTIFY,
        fields: &xyz(["cmx", "cmy", "cmz"]),
    },
    CharacteristicSchema {
        id: "CorUI",
        uuid: "d91cb6ee-1001-11ea-87d0-0242ac130003",
        capabilities: NOTIFY,
        fields: &[
            FieldSpec::new(UInt16, "ca0"),
            FieldSpec::new(UInt16, "ca1"),
            FieldSpec::new(UInt16, "ca2"),
            FieldSpec::new(UInt16, "cb"),
        ],
    },
    CharacteristicSchema {
        id: "CorLed",
        uuid: "d91cb6ee-3001-11ea-87d0-0242ac130003",
        capabilities: WRITE,
        fields: &rgb(["cr", "cg", "cb"]),
    },
    CharacteristicSchema {
        id: "BolAccelerometer",
        uuid: "d91cb6ee-2002-11ea-87d0-0242ac130003",
        capabilities: NOTIFY,
        fields: &xyz(["bax", "bay", "baz"]),
    },
    CharacteristicSchema {
        id: "BolGyroscope",
        uuid: "d91cb6ee-2003-11ea-87d0-0242ac130003",
        capabilities: NOTIFY,
        fields: &xyz(["bgx", "bgy", "bgz"]),
    },
    CharacteristicSchema {
        id: "BolMagnetometer",
        uuid: "d91cb6ee-2004-11ea-87d0-0242ac130003",
        capabilities: NOTIFY,
        fields: &xyz(["bmx", "bmy", "bmz"]),
    },
    CharacteristicSchema {
        id: "BolUI",
        uuid: "d91cb6ee-2001-11ea-87d0-0242ac130003",
        capabilities: NOTIFY_WRITE,
        fields: &[
            FieldSpec::new(UInt16, "ba0"),
            FieldSpec::new(UInt16, "ba1"),
            FieldSpec::new(UInt16, "ba2"),
            FieldSpec::new(UInt16, "ba3"),
            FieldSpec::new(UInt16, "bb"),
        ],
    },
    CharacteristicSchema {
        id: "BolLed",
        uuid: "d91cb6ee-4001-11ea-87d0-0242ac130003",
        capabilities: READ_WRITE,
        fields: &rgb(["br", "bg", "bb"]),
    },
];

/// Look up a schema in the full catalog, enabled or not
pub fn find(sensor_id: &str) -> Option<&'static CharacteristicSchema> {
    CATALOG.iter().find(|schema| schema.id == sensor_id)
}

/// The enabled subset of the catalog for one engine instance
#[derive(Debug, Clone)]
pub struct SensorRegistry {
    active: Vec<&'static CharacteristicSchema>,
}

impl SensorRegistry {
    /// Build the active set from an enable list
    ///
    /// The active set keeps catalog order. Each enable entry the catalog
    /// does not define produces one `ConfigurationWarning`; those entries
    /// are otherwise ignored.
    ///
    /// # Returns
    /// The registry and the warnings collected while filtering
    pub fn new<S: AsRef<str>>(enable: &[S]) -> (Self, Vec<EngineError>) {
        let mut warnings = Vec::new();
        let mut reported: Vec<&str> = Vec::new();

        for id in enable.iter().map(AsRef::as_ref) {
            if find(id).is_none() && !reported.contains(&id) {
                debug!("Sensor {} is enabled but not defined in the catalog", id);
                warnings.push(EngineError::not_in_catalog(id));
                reported.push(id);
            }
        }

        let active = CATALOG
            .iter()
            .filter(|schema| enable.iter().any(|id| id.as_ref() == schema.id))
            .collect();

        (SensorRegistry { active }, warnings)
    }

    /// Schema of an enabled sensor
    pub fn lookup(&self, sensor_id: &str) -> Result<&'static CharacteristicSchema, EngineError> {
        self.active
            .iter()
            .copied()
            .find(|schema| schema.id == sensor_id)
            .ok_or_else(|| EngineError::UnknownSensor(sensor_id.to_string()))
    }

    pub fn active(&self) -> &[&'static CharacteristicSchema] {
        &self.active
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
