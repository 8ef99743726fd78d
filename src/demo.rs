//! Synthetic 30-day series used when neither the API nor the static copy answers.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, Utc};
use rand::Rng;

use crate::model::{EventDocument, EventMeta, Sample, WindowMetrics};

pub const DEMO_DAYS: i64 = 30;
pub const DEMO_LAT: f64 = -35.0;
pub const DEMO_LON: f64 = -72.5;
/// Default AOI reference, relative to the static base.
pub const DEFAULT_AOI_PATH: &str = "config/aoi.geojson";

/// Fixed IASi weights for A,R,D,M,S.
pub const IASI_WEIGHTS: [f64; 5] = [0.25, 0.20, 0.25, 0.15, 0.15];

pub fn weighted_iasi(components: [f64; 5]) -> f64 {
    components
        .iter()
        .zip(IASI_WEIGHTS.iter())
        .map(|(c, w)| c * w)
        .sum()
}

/// Sample for a day `age` days before `today`. Only M consumes the RNG.
fn demo_sample<R: Rng + ?Sized>(today: NaiveDate, age: i64, rng: &mut R) -> Sample {
    let i = age as f64;
    let a = 0.3 + 0.2 * (i / 5.0).sin();
    let r = 0.4 + 0.15 * (i / 6.0).cos();
    let d = 0.2 + 0.5 * (i / 9.0).sin().max(0.0);
    let m = 0.2 + 0.3 * rng.gen::<f64>() * 0.2;
    let s = 0.3 + 0.2 * (i / 7.0).cos();
    let date = today - Duration::days(age);

    Sample {
        date: Some(date.format("%Y-%m-%d").to_string()),
        a: Some(a),
        r: Some(r),
        d: Some(d),
        m: Some(m),
        s: Some(s),
        iasi: Some(weighted_iasi([a, r, d, m, s])),
        ..Sample::default()
    }
}

fn demo_metrics() -> BTreeMap<String, WindowMetrics> {
    let row = |auc_pr: f64, f1: f64, fa: f64, lead: f64| WindowMetrics {
        auc_pr: Some(auc_pr),
        f1: Some(f1),
        false_alarm_pm: Some(fa),
        lead_time_days: Some(lead),
        ..WindowMetrics::default()
    };
    BTreeMap::from([
        ("7".to_string(), row(0.58, 0.50, 1.5, 3.0)),
        ("14".to_string(), row(0.62, 0.52, 1.4, 3.0)),
        ("30".to_string(), row(0.55, 0.49, 1.8, 2.0)),
    ])
}

/// Build the demo document for `name`, oldest sample first.
pub fn synthesize<R: Rng + ?Sized>(name: &str, today: NaiveDate, rng: &mut R) -> EventDocument {
    let timeline = (0..DEMO_DAYS)
        .rev()
        .map(|age| demo_sample(today, age, rng))
        .collect();

    EventDocument {
        meta: EventMeta {
            name: name.to_string(),
            lat: Some(DEMO_LAT),
            lon: Some(DEMO_LON),
            aoi_path: Some(DEFAULT_AOI_PATH.to_string()),
            ..EventMeta::default()
        },
        timeline,
        metrics: demo_metrics(),
    }
}

pub fn synthesize_today(name: &str) -> EventDocument {
    synthesize(name, Utc::now().date_naive(), &mut rand::thread_rng())
}
