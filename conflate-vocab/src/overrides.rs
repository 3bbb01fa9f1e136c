//! Curated override tables for the type walk.
//!
//! These are externally maintained reference data, read-only to the
//! resolver and injected rather than ambient: a skip set of types whose
//! subtrees over-generalize, a stop set of types specific enough that
//! expanding their ancestors only adds noise, a table of extra tag rules
//! for types whose declared tag equivalences are incomplete, and a
//! blocklist of generic tags that match almost anything.
//!
//! The id lists are hand-curated upstream; no derivation rule is implied
//! by the specific ids present.

use conflate_core::item::ItemId;
use conflate_core::tag_rule::TagRule;
use rustc_hash::{FxHashMap, FxHashSet};

/// building (generic architectural structure class).
pub const BUILDING: ItemId = ItemId(41_176);
/// tram stop
pub const TRAM_STOP: ItemId = ItemId(2_175_765);
/// aerodrome
pub const AERODROME: ItemId = ItemId(62_447);
/// airport
pub const AIRPORT: ItemId = ItemId(1_248_784);

/// Tag-or-key strings dropped from every type's declared equivalences:
/// generic bookkeeping tags that would match almost any mapped feature.
const TAG_BLOCKLIST: &[&str] = &[
    "Key:addr",
    "Key:addr:street",
    "Key:brand",
    "Key:lit",
    "Key:name",
    "Key:symbol",
];

/// Extra tag rules per type id, supplementing the knowledge graph's
/// declared tag equivalences. Curated upstream.
const EXTRA_KEYS: &[(u64, &[&str])] = &[
    // school
    (3_914, &[
        "Tag:building=school",
        "Tag:building=college",
        "Tag:amenity=college",
        "Tag:office=educational_institution",
    ]),
    (322_563, EDU),      // vocational school
    (383_092, EDU),      // film school
    (1_021_290, EDU),    // music school
    (1_244_442, EDU),    // school building
    (1_469_420, EDU),    // adult education centre
    (2_143_781, EDU),    // drama school
    (2_385_804, EDU),    // educational institution
    (5_167_149, EDU),    // cooking school
    (7_894_959, EDU),    // University Technical College
    (47_530_379, EDU),   // agricultural college
    (38_723, EDU),       // higher education institution
    (11_303, TALL),      // skyscraper
    (18_142, TALL),      // high-rise building
    (11_755_959, TALL),  // multi-storey building
    (641_226, &["Tag:leisure=stadium"]), // arena
    (2_301_048, &["Tag:aeroway=helipad"]), // special airfield
    (622_425, &["Tag:amenity=pub", "Tag:amenity=music_venue"]), // nightclub
    (187_456, &["Tag:amenity=pub", "Tag:amenity=nightclub"]), // bar
    (16_917, &["Tag:amenity=clinic", "Tag:building=clinic"]), // hospital
    (330_284, &["Tag:amenity=market"]), // marketplace
    (5_307_737, &["Tag:amenity=pub", "Tag:amenity=bar"]), // drinking establishment
    (875_157, &["Tag:tourism=resort"]), // resort
    // square
    (174_782, &[
        "Tag:leisure=park",
        "Tag:highway=pedestrian",
        "Tag:foot=yes",
        "Tag:area=yes",
        "Tag:amenity=market",
        "Tag:leisure=common",
    ]),
    (34_627, &["Tag:religion=jewish"]), // synagogue
    (16_970, &["Tag:religion=christian"]), // church
    (32_815, &["Tag:religion=islam"]), // mosque
    (811_979, &["Key:building"]), // architectural structure
    (11_691, &["Key:building"]), // stock exchange
    (1_329_623, &["Tag:amenity=arts_centre", "Tag:amenity=community_centre"]), // cultural centre
    (856_584, &["Tag:amenity=library"]), // library building
    (11_315, &["Tag:landuse=retail"]), // shopping mall
    (39_658_032, &["Tag:landuse=retail"]), // open air shopping centre
    (277_760, &["Tag:historic=folly", "Tag:historic=city_gate"]), // gatehouse
    (180_174, &["Tag:historic=folly"]), // folly
    (15_243_209, &["Tag:leisure=park", "Tag:boundary=national_park"]), // historic district
    (3_010_369, &["Tag:historic=monument"]), // opening ceremony
    (123_705, &["Tag:place=suburb"]), // neighbourhood
    (256_020, &["Tag:amenity=pub"]), // inn
    (41_253, &["Tag:amenity=theatre"]), // movie theater
    (17_350_442, &["Tag:amenity=theatre"]), // venue
    (156_362, &["Tag:amenity=winery"]), // winery
    (14_092, &["Tag:leisure=fitness_centre", "Tag:leisure=sports_centre"]), // gymnasium
    // hotel
    (27_686, &[
        "Tag:tourism=hostel",
        "Tag:tourism=guest_house",
        "Tag:building=hotel",
        "Tag:landuse=residential",
    ]),
    // restaurant
    (11_707, &[
        "Tag:amenity=cafe",
        "Tag:amenity=fast_food",
        "Tag:shop=deli",
        "Tag:shop=bakery",
        "Key:cuisine",
    ]),
    (2_360_219, &["Tag:amenity=embassy"]), // permanent mission
    (27_995_042, &["Tag:protection_title=Wilderness Area"]), // wilderness area
    (838_948, &["Tag:historic=memorial", "Tag:historic=monument"]), // work of art
    (23_413, &["Tag:place=locality"]), // castle
    // contour fort
    (28_045_079, &[
        "Tag:historic=archaeological_site",
        "Tag:site_type=fortification",
        "Tag:embankment=yes",
    ]),
    // hillfort
    (744_099, &[
        "Tag:historic=archaeological_site",
        "Tag:site_type=fortification",
        "Tag:embankment=yes",
    ]),
    (515, &["Tag:border_type=city"]), // city
    (1_254_933, &["Tag:amenity=university"]), // astronomical observatory
    (1_976_594, &["Tag:landuse=industrial"]), // science park
    (190_928, &["Tag:landuse=industrial"]), // shipyard
    (4_663_385, &["Tag:historic=train_station", "Tag:railway=historic_station"]), // former railway station
    (11_997_323, &["Tag:emergency=lifeboat_station"]), // lifeboat station
    (16_884_952, &["Tag:castle_type=stately", "Tag:building=country_house"]), // country house
    (1_343_246, &["Tag:castle_type=stately", "Tag:building=country_house"]), // English country house
    (4_919_932, &["Tag:castle_type=stately"]), // stately home
    (1_763_828, &["Tag:amenity=community_centre"]), // multi-purpose hall
    (3_469_910, &["Tag:amenity=community_centre"]), // performing arts center
    (57_660_343, &["Tag:amenity=community_centre"]), // performing arts building
    // nonprofit organization
    (163_740, &[
        "Tag:amenity=community_centre",
        "Tag:amenity=social_facility",
        "Key:social_facility",
    ]),
    (41_176, &["Key:building:levels"]), // building
    (44_494, &["Tag:historic=mill"]), // mill
    (56_822_897, &["Tag:historic=mill"]), // mill building
    (2_175_765, &["Tag:public_transport=stop_area"]), // tram stop
    // statue
    (179_700, &[
        "Tag:memorial=statue",
        "Tag:memorial:type=statue",
        "Tag:historic=memorial",
    ]),
    (1_076_486, &["Tag:landuse=recreation_ground"]), // sports venue
    (988_108, &["Tag:amenity=community_centre", "Tag:community_centre=club_home"]), // club
    (27_028_153, &["Tag:service=yard", "Tag:landuse=railway"]), // tram depot
    (19_563_580, &["Tag:landuse=railway"]), // rail yard
    (134_447, &["Tag:generator:source=nuclear"]), // nuclear power plant
    (1_258_086, &["Tag:leisure=park", "Tag:boundary=national_park"]), // National Historic Site
    (32_350_958, &["Tag:leisure=bingo"]), // bingo hall
    (53_060, &["Tag:historic=gate", "Tag:tourism=attraction"]), // gate
    (3_947, &["Tag:tourism=hotel", "Tag:building=hotel", "Tag:tourism=guest_house"]), // house
    (847_017, &["Tag:leisure=sports_centre"]), // sports club
    (820_477, &["Tag:landuse=quarry", "Tag:gnis:feature_type=Mine"]), // mine
    (77_115, &["Tag:leisure=sports_centre"]), // community center
    (35_535, &["Tag:amenity=police"]), // police
    (16_560, &["Tag:tourism=attraction", "Tag:historic=yes"]), // palace
    (131_734, &["Tag:amenity=pub", "Tag:industrial=brewery"]), // brewery
    (828_909, &["Tag:landuse=commercial", "Tag:landuse=industrial", "Tag:historic=dockyard"]), // wharf
    (10_283_556, &["Tag:landuse=railway"]), // motive power depot
    (18_674_739, &["Tag:leisure=stadium"]), // event venue
    (20_672_229, &["Tag:historic=archaeological_site"]), // friary
    (207_694, &["Tag:museum=art"]), // art museum
    // park
    (22_698, &[
        "Tag:leisure=dog_park",
        "Tag:amenity=market",
        "Tag:place=square",
        "Tag:leisure=common",
        "Tag:leisure=nature_reserve",
    ]),
    (738_570, &["Tag:place=suburb"]), // central business district
    (1_133_961, &["Tag:place=suburb"]), // commercial district
    (935_277, &["Tag:gnis:ftype=Playa", "Tag:natural=sand"]), // salt pan
    (14_253_637, &["Tag:gnis:ftype=Playa", "Tag:natural=sand"]), // dry lake
    (63_099_748, &["Tag:tourism=hotel", "Tag:building=hotel", "Tag:tourism=guest_house"]), // hotel building
    // plaza
    (2_997_369, &[
        "Tag:leisure=park",
        "Tag:highway=pedestrian",
        "Tag:foot=yes",
        "Tag:area=yes",
        "Tag:amenity=market",
        "Tag:leisure=common",
    ]),
    // ski resort
    (130_003, &[
        "Tag:landuse=winter_sports",
        "Tag:site=piste",
        "Tag:leisure=resort",
        "Tag:landuse=recreation_ground",
    ]),
    // business
    (4_830_453, &[
        "Key:office",
        "Tag:building=office",
        "Tag:landuse=retail",
        "Tag:landuse=industrial",
    ]),
    (43_229, &["Key:office", "Tag:building=office"]), // organization
    (17_084_016, &["Tag:office=association", "Tag:office=ngo"]), // nonprofit corporation
    (83_620, &["Key:highway"]), // thoroughfare
    (33_506, &["Key:building"]), // museum
    (4_287_745, &["Tag:amenity=hospital", "Tag:healthcare=hospital"]), // medical organization
    (4_022, &["Key:waterway"]), // stream
    (55_659_167, &["Key:waterway"]), // natural watercourse
    (14_350, &["Key:communication:radio", "Tag:studio=radio", "Tag:amenity=studio"]), // radio station
    (166_118, &["Tag:tourism=museum", "Tag:amenity=library"]), // archive
    (486_972, &["Key:place"]), // human settlement
    (42_948, &["Key:barrier"]), // wall
    (939_644, &["Tag:historic=memorial"]), // high cross
    (2_046_310, &["Tag:historic=archaeological_site"]), // bowl barrow
    (2_046_325, &["Tag:historic=archaeological_site"]), // round barrow
    (472_577, &["Tag:shop=mall"]), // retail park
    (742_421, &["Tag:amenity=theatre"]), // theatrical troupe
    (962_715, &["Key:building"]), // gas holder
    (52_063_214, &["Tag:boundary=national_park"]), // provincial park
    (47_509_284, &["Tag:landuse=brownfield"]), // assembly plant
    (15_893_266, &["Tag:landuse=brownfield"]), // former entity
    (43_501, &["Tag:landuse=brownfield"]), // zoo
];

const EDU: &[&str] = &[
    "Tag:amenity=college",
    "Tag:amenity=university",
    "Tag:amenity=school",
    "Tag:office=educational_institution",
    "Tag:building=university",
];

const TALL: &[&str] = &["Key:height", "Key:building:levels"];

/// Injected override tables for a resolver instance.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    skip_types: FxHashSet<ItemId>,
    stop_types: FxHashSet<ItemId>,
    extra_keys: FxHashMap<ItemId, Vec<TagRule>>,
    tag_blocklist: FxHashSet<TagRule>,
}

impl Overrides {
    /// Empty tables (used by tests that inject synthetic sets).
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in curated tables.
    pub fn builtin() -> Self {
        let extra_keys = EXTRA_KEYS
            .iter()
            .map(|(id, rules)| {
                let parsed = rules
                    .iter()
                    .map(|s| TagRule::parse(s).expect("curated rule table entry must parse"))
                    .collect();
                (ItemId(*id), parsed)
            })
            .collect();

        let tag_blocklist = TAG_BLOCKLIST
            .iter()
            .map(|s| TagRule::parse(s).expect("curated blocklist entry must parse"))
            .collect();

        Overrides {
            skip_types: FxHashSet::default(),
            stop_types: FxHashSet::default(),
            extra_keys,
            tag_blocklist,
        }
    }

    /// Add type ids whose subtrees are never expanded.
    pub fn with_skip_types(mut self, ids: impl IntoIterator<Item = ItemId>) -> Self {
        self.skip_types.extend(ids);
        self
    }

    /// Add "specific enough" type ids whose ancestors are not walked.
    pub fn with_stop_types(mut self, ids: impl IntoIterator<Item = ItemId>) -> Self {
        self.stop_types.extend(ids);
        self
    }

    /// Add extra tag rules for a type id.
    pub fn with_extra_keys(mut self, id: ItemId, rules: impl IntoIterator<Item = TagRule>) -> Self {
        self.extra_keys.entry(id).or_default().extend(rules);
        self
    }

    pub fn skip_types(&self) -> &FxHashSet<ItemId> {
        &self.skip_types
    }

    pub fn is_stop_type(&self, id: ItemId) -> bool {
        self.stop_types.contains(&id)
    }

    pub fn extra_keys(&self, id: ItemId) -> &[TagRule] {
        self.extra_keys.get(&id).map_or(&[], Vec::as_slice)
    }

    pub fn is_blocked(&self, rule: &TagRule) -> bool {
        self.tag_blocklist.contains(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables_parse() {
        let overrides = Overrides::builtin();
        // library building contributes amenity=library
        let rules = overrides.extra_keys(ItemId(856_584));
        assert_eq!(rules, &[TagRule::parse("Tag:amenity=library").unwrap()]);
        assert!(overrides.is_blocked(&TagRule::parse("Key:addr:street").unwrap()));
    }

    #[test]
    fn test_builder_composition() {
        let overrides = Overrides::empty()
            .with_skip_types([BUILDING])
            .with_stop_types([ItemId(7)])
            .with_extra_keys(ItemId(9), [TagRule::parse("Key:waterway").unwrap()]);

        assert!(overrides.skip_types().contains(&BUILDING));
        assert!(overrides.is_stop_type(ItemId(7)));
        assert_eq!(overrides.extra_keys(ItemId(9)).len(), 1);
    }
}
