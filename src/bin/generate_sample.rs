use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    /// Pick from `items` with the given relative weights.
    fn weighted<'a>(&mut self, items: &[(&'a str, f64)]) -> &'a str {
        let total: f64 = items.iter().map(|(_, w)| w).sum();
        let mut roll = self.next_f64() * total;
        for (item, w) in items {
            if roll < *w {
                return *item;
            }
            roll -= w;
        }
        items[items.len() - 1].0
    }
}

struct CitySpec {
    file_stem: &'static str,
    stations: &'static [&'static str],
    demographics: bool,
    bike_types: bool,
    trips: usize,
}

const CITIES: [CitySpec; 3] = [
    CitySpec {
        file_stem: "chicago",
        stations: &[
            "Streeter Dr & Grand Ave",
            "Clinton St & Washington Blvd",
            "Canal St & Adams St",
            "Lake Shore Dr & Monroe St",
            "Theater on the Lake",
            "Wood St & Hubbard St",
        ],
        demographics: true,
        bike_types: true,
        trips: 600,
    },
    CitySpec {
        file_stem: "new_york_city",
        stations: &[
            "Pershing Square North",
            "E 17 St & Broadway",
            "W 21 St & 6 Ave",
            "West St & Chambers St",
            "Broadway & E 22 St",
        ],
        demographics: true,
        bike_types: false,
        trips: 500,
    },
    CitySpec {
        file_stem: "washington",
        stations: &[
            "Columbus Circle / Union Station",
            "Lincoln Memorial",
            "Jefferson Dr & 14th St SW",
            "Massachusetts Ave & Dupont Circle NW",
        ],
        demographics: false,
        bike_types: false,
        trips: 400,
    },
];

/// One generated row, already in its on-disk text form.
struct Row {
    start_time: String,
    end_time: String,
    duration: f64,
    start_station: &'static str,
    end_station: &'static str,
    user_type: &'static str,
    gender: Option<&'static str>,
    birth_year: Option<f64>,
    bike_type: &'static str,
}

fn generate_rows(city: &CitySpec, rng: &mut SimpleRng) -> Vec<Row> {
    // Commute-heavy hour profile.
    let hours: Vec<(u32, f64)> = (0..24)
        .map(|h| {
            let w = match h {
                7..=9 | 16..=18 => 6.0,
                10..=15 => 3.0,
                19..=22 => 2.0,
                _ => 0.5,
            };
            (h, w)
        })
        .collect();

    (0..city.trips)
        .map(|_| {
            let month = 1 + rng.below(6) as u32;
            let day = 1 + rng.below(28) as u32;
            let hour = {
                let mut roll = rng.next_f64() * hours.iter().map(|(_, w)| w).sum::<f64>();
                hours
                    .iter()
                    .find(|(_, w)| {
                        let hit = roll < *w;
                        roll -= w;
                        hit
                    })
                    .map_or(23, |(h, _)| *h)
            };
            let minute = rng.below(60) as u32;
            let second = rng.below(60) as u32;
            let duration = (60 + rng.below(2400)) as f64;

            let start = chrono::NaiveDate::from_ymd_opt(2017, month, day)
                .and_then(|d| d.and_hms_opt(hour, minute, second))
                .expect("generated date is valid");
            let end = start + chrono::Duration::seconds(duration as i64);

            let n = city.stations.len() as u64;
            let start_station = city.stations[rng.below(n) as usize];
            let end_station = city.stations[rng.below(n) as usize];

            let user_type = rng.weighted(&[("Subscriber", 0.8), ("Customer", 0.19), ("Dependent", 0.01)]);
            let (gender, birth_year) = if city.demographics && user_type == "Subscriber" {
                let gender = rng.weighted(&[("Male", 0.7), ("Female", 0.3)]);
                (Some(gender), Some((1950 + rng.below(50)) as f64))
            } else {
                (None, None)
            };
            let bike_type = rng.weighted(&[("Standard", 0.75), ("Electric", 0.25)]);

            Row {
                start_time: start.format("%Y-%m-%d %H:%M:%S").to_string(),
                end_time: end.format("%Y-%m-%d %H:%M:%S").to_string(),
                duration,
                start_station,
                end_station,
                user_type,
                gender,
                birth_year,
                bike_type,
            }
        })
        .collect()
}

fn write_csv(path: &Path, city: &CitySpec, rows: &[Row]) {
    let mut writer = csv::Writer::from_path(path).expect("Failed to create CSV file");

    let mut header = vec![
        "Start Time",
        "End Time",
        "Trip Duration",
        "Start Station",
        "End Station",
        "User Type",
    ];
    if city.demographics {
        header.extend(["Gender", "Birth Year"]);
    }
    if city.bike_types {
        header.push("Bike Type");
    }
    writer.write_record(&header).expect("Failed to write header");

    for row in rows {
        let mut record = vec![
            row.start_time.clone(),
            row.end_time.clone(),
            row.duration.to_string(),
            row.start_station.to_string(),
            row.end_station.to_string(),
            row.user_type.to_string(),
        ];
        if city.demographics {
            record.push(row.gender.unwrap_or("").to_string());
            record.push(row.birth_year.map(|y| format!("{y:.1}")).unwrap_or_default());
        }
        if city.bike_types {
            record.push(row.bike_type.to_string());
        }
        writer.write_record(&record).expect("Failed to write row");
    }
    writer.flush().expect("Failed to flush CSV");
}

fn write_parquet(path: &Path, rows: &[Row]) {
    let text = |f: fn(&Row) -> Option<&str>| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("Start Time", DataType::Utf8, false),
        Field::new("Trip Duration", DataType::Float64, false),
        Field::new("Start Station", DataType::Utf8, false),
        Field::new("End Station", DataType::Utf8, false),
        Field::new("User Type", DataType::Utf8, true),
        Field::new("Gender", DataType::Utf8, true),
        Field::new("Birth Year", DataType::Float64, true),
        Field::new("Bike Type", DataType::Utf8, true),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            text(|r| Some(r.start_time.as_str())),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.duration))),
            text(|r| Some(r.start_station)),
            text(|r| Some(r.end_station)),
            text(|r| Some(r.user_type)),
            text(|r| r.gender),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| r.birth_year).collect::<Vec<_>>(),
            )),
            text(|r| Some(r.bike_type)),
        ],
    )
    .expect("Failed to create RecordBatch");

    let file = std::fs::File::create(path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");
}

fn main() {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir).expect("Failed to create output directory");

    let mut rng = SimpleRng::new(42);

    for city in &CITIES {
        let rows = generate_rows(city, &mut rng);

        let csv_path = out_dir.join(format!("{}.csv", city.file_stem));
        write_csv(&csv_path, city, &rows);
        println!("Wrote {} trips to {}", rows.len(), csv_path.display());

        if city.bike_types {
            let pq_path = out_dir.join(format!("{}.parquet", city.file_stem));
            write_parquet(&pq_path, &rows);
            println!("Wrote {} trips to {}", rows.len(), pq_path.display());
        }
    }
}
