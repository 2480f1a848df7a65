/// Known equipment brands seen in AV and smart-home contracts, in
/// canonical casing. Multi-word brands come first so they match before
/// any single-word prefix would.
pub const KNOWN_BRANDS: &[&str] = &[
    "James Loudspeaker",
    "Origin Acoustics",
    "Access Networks",
    "Middle Atlantic",
    "Just Add Power",
    "Snap One",
    "Crestron",
    "Savant",
    "Control4",
    "Lutron",
    "Sonance",
    "Samsung",
    "Sony",
    "Ubiquiti",
    "UniFi",
    "WattBox",
    "Episode",
    "Binary",
    "Apple",
    "Sonos",
    "Denon",
    "Marantz",
    "Yamaha",
    "Epson",
    "Atlona",
    "QSC",
    "Shure",
    "Araknis",
    "Parasound",
    "Innovolt",
    "SurgeX",
    "Bose",
    "Klipsch",
    "JBL",
    "Harman",
    "Russound",
    "Autonomic",
    "Seura",
    "Leon",
    "Triad",
    "Pakedge",
    "Ruckus",
    "LG",
];
