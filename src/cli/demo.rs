use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{PricePairError, Result};
use crate::fmt::pounds;
use crate::settings::{get_data_dir, load_settings};

/// A postcode with the ONSPD attributes the demo reference file carries.
struct DemoPostcode {
    postcode: &'static str,
    ru_code: &'static str,
    region: &'static str,
    lat: f64,
    long: f64,
    street: &'static str,
}

const POSTCODES: &[DemoPostcode] = &[
    DemoPostcode { postcode: "LS1 4AP", ru_code: "A1", region: "E12000003", lat: 53.7997, long: -1.5492, street: "PARK ROW" },
    DemoPostcode { postcode: "M1 1AE", ru_code: "A1", region: "E12000002", lat: 53.4794, long: -2.2453, street: "PICCADILLY" },
    DemoPostcode { postcode: "SW1A 2AA", ru_code: "A1", region: "E12000007", lat: 51.5034, long: -0.1276, street: "DOWNING STREET" },
    DemoPostcode { postcode: "BS1 4DJ", ru_code: "C1", region: "E12000009", lat: 51.4545, long: -2.5879, street: "KING STREET" },
    DemoPostcode { postcode: "CF10 1EP", ru_code: "C1", region: "W99999999", lat: 51.4816, long: -3.1791, street: "QUEEN STREET" },
    DemoPostcode { postcode: "LL55 4UR", ru_code: "E2", region: "W99999999", lat: 53.1170, long: -4.1300, street: "HIGH STREET" },
    DemoPostcode { postcode: "TR19 7AA", ru_code: "F2", region: "E12000009", lat: 50.0660, long: -5.7150, street: "CHURCH ROAD" },
    DemoPostcode { postcode: "NR21 0AB", ru_code: "E1", region: "E12000006", lat: 52.8300, long: 0.8500, street: "THE STREET" },
    DemoPostcode { postcode: "DE4 3AA", ru_code: "D1", region: "E12000004", lat: 53.1390, long: -1.5540, street: "SMEDLEY STREET" },
    DemoPostcode { postcode: "NE1 7RU", ru_code: "A1", region: "E12000001", lat: 54.9738, long: -1.6132, street: "GREY STREET" },
    DemoPostcode { postcode: "B1 1BB", ru_code: "A1", region: "E12000005", lat: 52.4796, long: -1.9026, street: "NEW STREET" },
    DemoPostcode { postcode: "OX1 3BG", ru_code: "C1", region: "E12000008", lat: 51.7520, long: -1.2577, street: "BROAD STREET" },
];

const PROPERTY_TYPES: &[&str] = &["T", "S", "D", "F"];
const PROPERTIES: usize = 72;
/// Properties below this index sell in both years so the demo always links.
const ALWAYS_RESOLD: usize = 12;
/// Sold twice in each year to exercise the tie-break policies.
const RESOLD_IN_YEAR: &[usize] = &[0, 3, 6];
/// Its only current-year sale is recorded at £0.
const ZERO_PRICE: usize = 2;
/// Its baseline sale is missing a postcode.
const NO_POSTCODE: usize = 1;

struct DemoProperty {
    postcode: usize,
    paon: String,
    saon: String,
    property_type: &'static str,
    base_price: u64,
    growth: f64,
}

struct DemoSale {
    id: String,
    price: u64,
    date: NaiveDate,
    postcode: String,
    property: usize,
}

struct DemoData {
    baseline: Vec<DemoSale>,
    current: Vec<DemoSale>,
    properties: Vec<DemoProperty>,
}

fn round_price(raw: f64) -> u64 {
    ((raw / 500.0).round() * 500.0) as u64
}

fn sale_date(rng: &mut StdRng, year: i32) -> Result<NaiveDate> {
    let ordinal = rng.gen_range(1..=365);
    NaiveDate::from_yo_opt(year, ordinal)
        .ok_or_else(|| PricePairError::Other(format!("no day {ordinal} in {year}")))
}

fn generate_properties(rng: &mut StdRng) -> Vec<DemoProperty> {
    (0..PROPERTIES)
        .map(|i| {
            let property_type = PROPERTY_TYPES[i % PROPERTY_TYPES.len()];
            let saon = if property_type == "F" {
                format!("FLAT {}", i % 9 + 1)
            } else {
                String::new()
            };
            DemoProperty {
                postcode: i % POSTCODES.len(),
                paon: ((i / POSTCODES.len() + 1) * 2).to_string(),
                saon,
                property_type,
                base_price: round_price(rng.gen_range(80_000.0..300_000.0)),
                growth: rng.gen_range(0.85..1.8),
            }
        })
        .collect()
}

fn generate(seed: u64, baseline_year: i32, current_year: i32) -> Result<DemoData> {
    let mut rng = StdRng::seed_from_u64(seed);
    let properties = generate_properties(&mut rng);
    let mut baseline = Vec::new();
    let mut current = Vec::new();

    for (i, prop) in properties.iter().enumerate() {
        let forced = i < ALWAYS_RESOLD;
        let sells_early = forced || rng.gen_bool(0.6);
        let sells_late = forced || rng.gen_bool(0.5);
        let repeats = if RESOLD_IN_YEAR.contains(&i) { 2 } else { 1 };
        let postcode = POSTCODES[prop.postcode].postcode.to_string();

        if sells_early {
            for n in 0..repeats {
                let jitter = 1.0 + n as f64 * 0.03;
                baseline.push(DemoSale {
                    id: format!("{{DEMO-{baseline_year}-{:05}}}", baseline.len() + 1),
                    price: round_price(prop.base_price as f64 * jitter),
                    date: sale_date(&mut rng, baseline_year)?,
                    postcode: if i == NO_POSTCODE { String::new() } else { postcode.clone() },
                    property: i,
                });
            }
        }
        if sells_late {
            let repeats = if i == ZERO_PRICE { 1 } else { repeats };
            for n in 0..repeats {
                let jitter = 1.0 + n as f64 * 0.02;
                let price = if i == ZERO_PRICE {
                    0
                } else {
                    round_price(prop.base_price as f64 * prop.growth * jitter)
                };
                current.push(DemoSale {
                    id: format!("{{DEMO-{current_year}-{:05}}}", current.len() + 1),
                    price,
                    date: sale_date(&mut rng, current_year)?,
                    postcode: postcode.clone(),
                    property: i,
                });
            }
        }
    }

    Ok(DemoData { baseline, current, properties })
}

fn write_sales(path: &Path, sales: &[DemoSale], properties: &[DemoProperty]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Always)
        .from_path(path)?;
    for sale in sales {
        let prop = &properties[sale.property];
        let place = &POSTCODES[prop.postcode];
        let tenure = if prop.property_type == "F" { "L" } else { "F" };
        let price = sale.price.to_string();
        let date = format!("{} 00:00", sale.date.format("%Y-%m-%d"));
        wtr.write_record([
            sale.id.as_str(),
            price.as_str(),
            date.as_str(),
            sale.postcode.as_str(),
            prop.property_type,
            "N",
            tenure,
            prop.paon.as_str(),
            prop.saon.as_str(),
            place.street,
            "",
            "DEMOTOWN",
            "DEMOSHIRE",
            "DEMOSHIRE",
            "A",
            "A",
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_reference(path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["pcd", "pcds", "ru11ind", "rgn", "lat", "long"])?;
    for p in POSTCODES {
        let pcd = p.postcode.replace(' ', "");
        let lat = p.lat.to_string();
        let long = p.long.to_string();
        wtr.write_record([
            pcd.as_str(),
            p.postcode,
            p.ru_code,
            p.region,
            lat.as_str(),
            long.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn price_range(sales: &[DemoSale]) -> String {
    let priced = sales.iter().map(|s| s.price).filter(|p| *p > 0);
    match (priced.clone().min(), priced.max()) {
        (Some(lo), Some(hi)) => format!("{} to {}", pounds(lo), pounds(hi)),
        _ => "no prices".to_string(),
    }
}

pub fn run(dir: Option<String>) -> Result<()> {
    let settings = load_settings();
    let dir = dir
        .map(PathBuf::from)
        .unwrap_or_else(|| get_data_dir().join("sources").join("demo"));
    std::fs::create_dir_all(&dir)?;

    let data = generate(20_220_101, settings.baseline_year, settings.current_year)?;
    let (part1, part2) = data.baseline.split_at(data.baseline.len() / 2);

    let by = settings.baseline_year;
    let cy = settings.current_year;
    let part1_path = dir.join(format!("pp-{by}-part1.csv"));
    let part2_path = dir.join(format!("pp-{by}-part2.csv"));
    let current_path = dir.join(format!("pp-{cy}.csv"));
    let reference_path = dir.join("onspd.csv");

    write_sales(&part1_path, part1, &data.properties)?;
    write_sales(&part2_path, part2, &data.properties)?;
    write_sales(&current_path, &data.current, &data.properties)?;
    write_reference(&reference_path)?;

    println!("Demo data written to {}", dir.display());
    println!("  {by} sales:   {} ({})", data.baseline.len(), price_range(&data.baseline));
    println!("  {cy} sales:   {} ({})", data.current.len(), price_range(&data.current));
    println!("  Postcodes:    {}", POSTCODES.len());
    println!();
    println!("Try:");
    println!(
        "  pricepair run --baseline {} {} --current {} --reference {}",
        part1_path.display(),
        part2_path.display(),
        current_path.display(),
        reference_path.display()
    );
    Ok(())
}
