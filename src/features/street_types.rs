//! Street-type abbreviations found in Melbourne addresses.
//!
//! Keys are matched exactly against the last address token after text
//! normalization. Codes not listed here map to [`DEFAULT_STREET_TYPE`].
//! Full names are stored as written (`Meander Way`); the deriver normalizes
//! them before they reach the `StreetType` column.

pub const DEFAULT_STREET_TYPE: &str = "Street";

pub const STREET_TYPES: &[(&str, &str)] = &[
    ("St", "Street"),
    ("Rd", "Road"),
    ("Av", "Avenue"),
    ("Ct", "Court"),
    ("Dr", "Drive"),
    ("Cr", "Crescent"),
    ("Gr", "Grove"),
    ("Pl", "Place"),
    ("Pde", "Parade"),
    ("Cl", "Close"),
    ("Wy", "Way"),
    ("La", "Lane"),
    ("Bvd", "Boulevard"),
    ("Tce", "Terrace"),
    ("Cct", "Circuit"),
    ("Hwy", "Highway"),
    ("Avenue", "Avenue"),
    ("Ri", "Rise"),
    ("Wk", "Walk"),
    ("Mw", "Meander Way"),
    ("Boulevard", "Boulevard"),
    ("Sq", "Square"),
    ("Parade", "Parade"),
    ("Esplanade", "Esplanade"),
    ("N", "North"),
    ("Qd", "Quay"),
    ("Cir", "Circle"),
    ("Vw", "View"),
    ("S", "South"),
    ("Crescent", "Crescent"),
    ("Prm", "Promenade"),
    ("Gdns", "Gardens"),
    ("W", "West"),
    ("Strand", "Strand"),
    ("Grove", "Grove"),
    ("Ridge", "Ridge"),
    ("Vs", "Views"),
    ("Ch", "Chase"),
    ("Fairway", "Fairway"),
    ("Righi", "Right"),
    ("E", "East"),
    ("Grn", "Green"),
    ("Wyn", "Way"),
    ("Gln", "Glen"),
    ("Esp", "Esplanade"),
    ("Bnd", "Bend"),
    ("Mews", "Mews"),
    ("Rdg", "Ridge"),
    ("Pky", "Parkway"),
    ("Gra", "Grange"),
    ("Rt", "Route"),
    ("Res", "Reserve"),
    ("Wky", "Way"),
    ("East", "East"),
    ("Lk", "Lake"),
    ("Nk", "Nook"),
    ("Gwy", "Gateway"),
    ("Mall", "Mall"),
    ("Highway", "Highway"),
    ("Ambl", "Ambleside"),
    ("Terrace", "Terrace"),
    ("Pt", "Point"),
    ("Parkway", "Parkway"),
    ("Street", "Street"),
    ("Corso", "Corso"),
    ("Outlook", "Outlook"),
    ("Media", "Media"),
    ("Hub", "Hub"),
    ("Crofts", "Crofts"),
    ("Victoria", "Victoria"),
    ("Nth", "North"),
    ("Athol", "Athol"),
    ("Nook", "Nook"),
    ("Rise", "Rise"),
    ("Greenway", "Greenway"),
    ("Views", "Views"),
    ("street", "Street"),
    ("Hl", "Hill"),
    ("Glade", "Glade"),
    ("Cove", "Cove"),
    ("Qy", "Quay"),
    ("Lairidge", "Lairidge"),
    ("Scala", "Scala"),
    ("Broadway", "Broadway"),
    ("Road", "Road"),
    ("Prst", "Prestwick"),
    ("Grand", "Grand"),
    ("Loop", "Loop"),
    ("Eyrie", "Eyrie"),
    ("Dell", "Dell"),
    ("Gve", "Grove"),
    ("Pkt", "Pocket"),
    ("Al", "Alley"),
    ("West", "West"),
    ("Hts", "Heights"),
    ("Aveue", "Avenue"),
    ("Summit", "Summit"),
    ("Ave", "Avenue"),
    ("Woodland", "Woodland"),
    ("Edg", "Edge"),
    ("Skyline", "Skyline"),
    ("Out", "Outlook"),
    ("Range", "Range"),
    ("Hth", "Heath"),
    ("Atrium", "Atrium"),
    ("Gables", "Gables"),
    ("Mears", "Mears"),
    ("App", "Approach"),
    ("Brk", "Brook"),
    ("Spur", "Spur"),
    ("Court", "Court"),
    ("Pass", "Pass"),
    ("Gld", "Gold"),
    ("Crse", "Course"),
    ("Ps", "Passage"),
    ("Entrance", "Entrance"),
    ("Heights", "Heights"),
    ("Boulevarde", "Boulevarde"),
    ("Circuit", "Circuit"),
    ("Parks", "Parks"),
    ("Ridgeway", "Ridgeway"),
    ("Panorama", "Panorama"),
    ("Briars", "Briars"),
];

/// Full street type for an address code, [`DEFAULT_STREET_TYPE`] when unknown.
pub fn expand_street_type(code: &str) -> &'static str {
    STREET_TYPES
        .iter()
        .find(|(abbr, _)| *abbr == code)
        .map_or(DEFAULT_STREET_TYPE, |(_, full)| full)
}
