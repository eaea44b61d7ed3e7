//! Composition du dashboard Kafka
//!
//! Disposition fixe des widgets sur une grille de 24 colonnes. Les largeurs
//! sont des constantes de mise en page, reproduites telles quelles pour les
//! consommateurs existants du dashboard.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::metrics::{Metric, MetricBundle, MetricKind};

pub const GRID_COLUMNS: u32 = 24;
pub const WIDGET_HEIGHT: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    SingleValue,
    TimeSeries,
}

impl WidgetKind {
    fn view(&self) -> &'static str {
        match self {
            WidgetKind::SingleValue => "singleValue",
            WidgetKind::TimeSeries => "timeSeries",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Widget {
    pub kind: WidgetKind,
    pub title: String,
    pub metrics: Vec<Metric>,
    pub width: u32,
}

impl Widget {
    fn new(kind: WidgetKind, title: &str, metrics: Vec<Metric>, width: u32) -> Self {
        Self {
            kind,
            title: title.to_string(),
            metrics,
            width,
        }
    }
}

/// Widget placé sur la grille
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardLayout {
    pub widgets: Vec<Widget>,
}

impl DashboardLayout {
    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    pub fn widget(&self, title: &str) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.title == title)
    }

    /// Placement gauche → droite, retour à la ligne quand le widget ne tient plus
    pub fn positions(&self) -> Vec<Position> {
        let (mut x, mut y) = (0, 0);
        self.widgets
            .iter()
            .map(|widget| {
                let width = widget.width.min(GRID_COLUMNS);
                if x + width > GRID_COLUMNS {
                    x = 0;
                    y += WIDGET_HEIGHT;
                }
                let position = Position { x, y };
                x += width;
                position
            })
            .collect()
    }

    /// Corps JSON du dashboard au format CloudWatch
    pub fn render(&self, region: &str) -> Value {
        let widgets: Vec<Value> = self
            .widgets
            .iter()
            .zip(self.positions())
            .map(|(widget, pos)| {
                json!({
                    "type": "metric",
                    "x": pos.x,
                    "y": pos.y,
                    "width": widget.width,
                    "height": WIDGET_HEIGHT,
                    "properties": {
                        "view": widget.kind.view(),
                        "title": widget.title,
                        "region": region,
                        "metrics": widget.metrics.iter().map(metric_row).collect::<Vec<_>>(),
                    }
                })
            })
            .collect();

        json!({ "widgets": widgets })
    }
}

/// `[namespace, name, dim1, val1, ..., {stat, period}]`
fn metric_row(metric: &Metric) -> Value {
    let mut row = vec![json!(metric.namespace), json!(metric.name)];
    for (key, value) in &metric.dimensions {
        row.push(json!(key));
        row.push(json!(value));
    }
    row.push(json!({
        "stat": metric.statistic.as_str(),
        "period": metric.period_secs,
    }));
    Value::Array(row)
}

/// Dispose les widgets du bundle ; le widget de lag n'existe que s'il y a des groups
pub fn compose(bundle: &MetricBundle) -> DashboardLayout {
    let scalar = |kind| bundle.scalar(kind).cloned().into_iter().collect::<Vec<_>>();
    let series = |kind| bundle.per_broker(kind).to_vec();

    let mut widgets = vec![
        Widget::new(
            WidgetKind::SingleValue,
            "ActiveControllerCount",
            scalar(MetricKind::ActiveControllerCount),
            4,
        ),
        Widget::new(
            WidgetKind::TimeSeries,
            "OfflinePartitionsCount",
            scalar(MetricKind::OfflinePartitionsCount),
            4,
        ),
        Widget::new(
            WidgetKind::TimeSeries,
            "UnderReplicatedPartitions",
            series(MetricKind::UnderReplicatedPartitions),
            16,
        ),
        Widget::new(WidgetKind::TimeSeries, "CPU User", series(MetricKind::CpuUser), 12),
        Widget::new(
            WidgetKind::TimeSeries,
            "Disk Used",
            series(MetricKind::DataLogsDiskUsed),
            12,
        ),
    ];

    if !bundle.per_group_metrics.is_empty() {
        widgets.push(Widget::new(
            WidgetKind::TimeSeries,
            "MaxOffsetLag",
            bundle.per_group_metrics.metrics().cloned().collect(),
            12,
        ));
    }

    debug!("composed dashboard with {} widgets", widgets.len());
    DashboardLayout { widgets }
}
