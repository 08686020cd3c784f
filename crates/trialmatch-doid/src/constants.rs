//! Well-known DOIDs referenced by tumor and condition predicates

pub const DISEASE_OF_CELLULAR_PROLIFERATION_DOID: &str = "14566";
pub const CANCER_DOID: &str = "162";
pub const BENIGN_NEOPLASM_DOID: &str = "0060072";
pub const ORGAN_SYSTEM_CANCER_DOID: &str = "0050686";
pub const HEMATOLOGIC_CANCER_DOID: &str = "2531";

pub const CARCINOMA_DOID: &str = "305";
pub const ADENOCARCINOMA_DOID: &str = "299";
pub const SQUAMOUS_CELL_CARCINOMA_DOID: &str = "1749";
pub const ADENOSQUAMOUS_CARCINOMA_DOID: &str = "3905";

pub const LUNG_CANCER_DOID: &str = "1324";
pub const LUNG_NON_SMALL_CELL_CARCINOMA_DOID: &str = "3908";
pub const BREAST_CANCER_DOID: &str = "1612";
pub const COLORECTAL_CANCER_DOID: &str = "9256";
pub const MELANOMA_DOID: &str = "1909";
pub const CENTRAL_NERVOUS_SYSTEM_CANCER_DOID: &str = "3620";

/// DOIDs too unspecific to count as a typed primary tumor on their own
pub const UNSPECIFIC_TUMOR_DOIDS: [&str; 3] = [
    DISEASE_OF_CELLULAR_PROLIFERATION_DOID,
    CANCER_DOID,
    ORGAN_SYSTEM_CANCER_DOID,
];
