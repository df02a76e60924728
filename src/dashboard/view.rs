//! HTML page and Plotly figures for the dashboard

use crate::encoding::EncodingContract;
use crate::error::Result;
use crate::prediction::{FeatureImportance, Potential, Prediction, DECISION_THRESHOLD};
use crate::request::{
    CustomerProfile, YesNo, AGE_RANGE, CITY_TIER_RANGE, DESIGNATION, GENDER, INCOME_RANGE, MARITAL_STATUS,
    OCCUPATION, PITCH_RANGE, TRIPS_RANGE, TYPE_OF_CONTACT,
};
use serde_json::{json, Value};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

pub const IMPORTANCE_CAPTION: &str = "Importance is global to the model: it shows which factors the forest relies on \
     overall, not why this particular customer received this score.";

/// Result block rendered under the form after a successful prediction
pub struct Outcome<'a> {
    pub prediction: &'a Prediction,
    pub importances: &'a [FeatureImportance],
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// JSON safe to inline inside a `<script>` element
fn script_json(value: &Value) -> String {
    value.to_string().replace("</", "<\\/")
}

/// Form defaults: mid-range numbers and the first label of each selector
pub fn default_profile(contract: &EncodingContract) -> CustomerProfile {
    let first = |field: &str| {
        contract
            .labels(field)
            .ok()
            .and_then(|labels| labels.first().cloned())
            .unwrap_or_default()
    };
    CustomerProfile {
        age: 30,
        gender: first(GENDER),
        marital_status: first(MARITAL_STATUS),
        monthly_income: 25_000,
        type_of_contact: first(TYPE_OF_CONTACT),
        city_tier: 1,
        duration_of_pitch: 15,
        number_of_trips: 3,
        occupation: first(OCCUPATION),
        designation: first(DESIGNATION),
        passport: YesNo::No,
        own_car: YesNo::No,
    }
}

pub fn gauge_figure(prediction: &Prediction) -> Value {
    let threshold = DECISION_THRESHOLD * 100.0;
    json!({
        "data": [{
            "type": "indicator",
            "mode": "gauge+number",
            "value": prediction.probability * 100.0,
            "title": {"text": "Purchase Probability (%)"},
            "gauge": {
                "axis": {"range": [0, 100]},
                "bar": {"color": "darkblue"},
                "steps": [
                    {"range": [0.0, threshold], "color": "#FFCCCB"},
                    {"range": [threshold, 100.0], "color": "#90EE90"}
                ],
                "threshold": {
                    "line": {"color": "red", "width": 4},
                    "thickness": 0.75,
                    "value": threshold
                }
            }
        }],
        "layout": {"height": 320, "margin": {"t": 60, "b": 20}}
    })
}

/// Horizontal bar chart; `importances` arrive ascending so the largest bar is on top
pub fn importance_figure(importances: &[FeatureImportance]) -> Value {
    let names: Vec<&str> = importances.iter().map(|f| f.feature.as_str()).collect();
    let values: Vec<f64> = importances.iter().map(|f| f.importance).collect();
    json!({
        "data": [{
            "type": "bar",
            "orientation": "h",
            "x": values,
            "y": names,
            "marker": {"color": values, "colorscale": "Viridis", "showscale": true}
        }],
        "layout": {
            "title": {"text": "Top 10 Factors Influencing This Prediction"},
            "xaxis": {"title": {"text": "Importance"}},
            "yaxis": {"title": {"text": "Feature"}, "automargin": true},
            "height": 420
        }
    })
}

fn number_input(name: &str, label: &str, value: u32, (min, max): (u32, u32)) -> String {
    format!(
        r#"<label>{label}<input type="number" name="{name}" min="{min}" max="{max}" step="1" value="{value}" required></label>"#,
        label = escape_html(label),
    )
}

fn select<S: AsRef<str>>(name: &str, label: &str, options: &[S], selected: &str) -> String {
    let mut html = format!(r#"<label>{}<select name="{}">"#, escape_html(label), name);
    for option in options {
        let option = escape_html(option.as_ref());
        let mark = if option == escape_html(selected) { " selected" } else { "" };
        html.push_str(&format!(r#"<option value="{option}"{mark}>{option}</option>"#));
    }
    html.push_str("</select></label>");
    html
}

fn yes_no(name: &str, label: &str, selected: YesNo) -> String {
    select(name, label, &[YesNo::No.label(), YesNo::Yes.label()], selected.label())
}

fn form(contract: &EncodingContract, profile: &CustomerProfile) -> Result<String> {
    let tiers: Vec<String> = (CITY_TIER_RANGE.0..=CITY_TIER_RANGE.1).map(|t| t.to_string()).collect();

    let demographics = [
        number_input("age", "Age", profile.age, AGE_RANGE),
        select("gender", "Gender", contract.labels(GENDER)?, &profile.gender),
        select("marital_status", "Marital Status", contract.labels(MARITAL_STATUS)?, &profile.marital_status),
        number_input("monthly_income", "Monthly Income", profile.monthly_income, INCOME_RANGE),
    ];
    let engagement = [
        select("type_of_contact", "Type of Contact", contract.labels(TYPE_OF_CONTACT)?, &profile.type_of_contact),
        select("city_tier", "City Tier", &tiers, &profile.city_tier.to_string()),
        number_input("duration_of_pitch", "Duration of Pitch (min)", profile.duration_of_pitch, PITCH_RANGE),
        number_input("number_of_trips", "Number of Past Trips", profile.number_of_trips, TRIPS_RANGE),
    ];
    let professional = [
        select("occupation", "Occupation", contract.labels(OCCUPATION)?, &profile.occupation),
        select("designation", "Designation", contract.labels(DESIGNATION)?, &profile.designation),
        yes_no("passport", "Has Passport?", profile.passport),
        yes_no("own_car", "Owns Car?", profile.own_car),
    ];

    let column = |title: &str, inputs: &[String]| format!(r#"<fieldset><legend>{}</legend>{}</fieldset>"#, title, inputs.concat());

    Ok(format!(
        r#"<form method="post" action="/predict"><div class="columns">{}{}{}</div><button type="submit">Generate Prediction</button></form>"#,
        column("Demographics", &demographics),
        column("Engagement", &engagement),
        column("Professional Info", &professional),
    ))
}

fn results(outcome: &Outcome<'_>) -> String {
    let class = match outcome.prediction.potential {
        Potential::High => "status high",
        Potential::Low => "status low",
    };
    format!(
        r#"<section id="result">
<div id="gauge"></div>
<p class="{class}">{message}</p>
<h3>Why this prediction?</h3>
<div id="importance"></div>
<p class="caption">{caption}</p>
<script>
const gauge = {gauge};
const importance = {importance};
Plotly.newPlot('gauge', gauge.data, gauge.layout, {{responsive: true}});
Plotly.newPlot('importance', importance.data, importance.layout, {{responsive: true}});
</script>
</section>"#,
        message = escape_html(&outcome.prediction.message()),
        caption = IMPORTANCE_CAPTION,
        gauge = script_json(&gauge_figure(outcome.prediction)),
        importance = script_json(&importance_figure(outcome.importances)),
    )
}

/// Full page: form, optional input error banner, optional prediction result
pub fn render_page(
    contract: &EncodingContract,
    profile: &CustomerProfile,
    outcome: Option<&Outcome<'_>>,
    error: Option<&str>,
) -> Result<String> {
    let banner = error
        .map(|e| format!(r#"<p class="status error">{}</p>"#, escape_html(e)))
        .unwrap_or_default();
    let result = outcome.map(results).unwrap_or_default();

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Wellness Tourism Predictor</title>
<script src="{cdn}"></script>
<style>
body {{ font-family: sans-serif; margin: 2rem; }}
.columns {{ display: grid; grid-template-columns: repeat(3, 1fr); gap: 1rem; }}
fieldset label {{ display: block; margin: 0.5rem 0; }}
fieldset input, fieldset select {{ display: block; width: 100%; }}
.status {{ padding: 0.75rem; border-radius: 4px; }}
.high {{ background: #e6f4ea; }}
.low {{ background: #fff4e5; }}
.error {{ background: #fdecea; }}
.caption {{ color: #666; font-size: 0.9rem; }}
</style>
</head>
<body>
<h1>Visit with Us: Wellness Package Predictor</h1>
<h3>Decision Support System for Holiday Package Sales</h3>
{banner}
{form}
<hr>
{result}
</body>
</html>"#,
        cdn = PLOTLY_CDN,
        form = form(contract, profile)?,
    ))
}
