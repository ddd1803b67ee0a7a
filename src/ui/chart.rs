use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

use crate::window::AxisRange;

/// Price/bid/ask scatter on one shared value axis.
pub struct PriceChart<'a> {
    title: String,
    price: &'a [(i64, f64)],
    bid: &'a [(i64, f64)],
    ask: &'a [(i64, f64)],
    range: Option<AxisRange>,
}

impl<'a> PriceChart<'a> {
    pub fn new(symbol: &str, price: &'a [(i64, f64)]) -> Self {
        Self {
            title: format!(" Price ({}) ", symbol),
            price,
            bid: &[],
            ask: &[],
            range: None,
        }
    }

    pub fn bid(mut self, points: &'a [(i64, f64)]) -> Self {
        self.bid = points;
        self
    }

    pub fn ask(mut self, points: &'a [(i64, f64)]) -> Self {
        self.ask = points;
        self
    }

    pub fn range(mut self, range: Option<AxisRange>) -> Self {
        self.range = range;
        self
    }
}

fn visible_tail(points: &[(i64, f64)], width: usize) -> &[(i64, f64)] {
    if points.len() > width {
        &points[points.len() - width..]
    } else {
        points
    }
}

fn row_for(value: f64, range: AxisRange, chart_height: usize) -> usize {
    let width = range.width();
    let normalized = if width > 0.0 {
        ((value - range.min) / width).clamp(0.0, 1.0)
    } else {
        0.5
    };
    let offset = ((normalized * (chart_height - 1) as f64) as usize).min(chart_height - 1);
    chart_height - 1 - offset
}

impl Widget for PriceChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(self.title.as_str())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        block.render(area, buf);

        let Some(range) = self.range else {
            return;
        };
        if self.price.is_empty() || inner.height < 3 || inner.width < 10 {
            return;
        }

        let chart_height = inner.height.saturating_sub(1) as usize; // last row is the legend
        let chart_width = inner.width as usize;

        // Bid and ask first so the price line stays on top.
        let layers = [
            (self.bid, "·", Color::Green),
            (self.ask, "·", Color::Red),
            (self.price, "●", Color::Cyan),
        ];
        for (points, glyph, color) in layers {
            let visible = visible_tail(points, chart_width);
            for (i, &(_, value)) in visible.iter().enumerate() {
                let x = inner.x + i as u16;
                let y = inner.y + row_for(value, range, chart_height) as u16;
                buf.set_string(x, y, glyph, Style::default().fg(color));
            }
        }

        let label = Style::default().fg(Color::DarkGray);
        buf.set_string(inner.x, inner.y, format!("{:.2}", range.max), label);
        buf.set_string(
            inner.x,
            inner.y + chart_height as u16 - 1,
            format!("{:.2}", range.min),
            label,
        );

        let legend = Line::from(vec![
            Span::styled("● price ", Style::default().fg(Color::Cyan)),
            Span::styled("· bid ", Style::default().fg(Color::Green)),
            Span::styled("· ask", Style::default().fg(Color::Red)),
        ]);
        buf.set_line(inner.x, inner.y + inner.height - 1, &legend, inner.width);
    }
}
