use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use mortality_globe::{
    dataset::Record,
    palette::Rgb,
    quantile::FiveNumberSummary,
    views::RegionShade,
    Dashboard, DeathCategory, OccupationCategory, Playback,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Map, MapResolution, Points},
        Block, Borders, Cell, Paragraph, Row, Table, TableState,
    },
    Frame, Terminal,
};
use std::io;
use std::time::Instant;

/// Upper end of the boxplot age axis
const AGE_AXIS_MAX: f64 = 120.0;
const YEAR_STEP: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Globe,
    Boxplot,
    Heatmap,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Globe => Page::Boxplot,
            Page::Boxplot => Page::Heatmap,
            Page::Heatmap => Page::Globe,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Globe => Page::Heatmap,
            Page::Boxplot => Page::Globe,
            Page::Heatmap => Page::Boxplot,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Globe => "Globe",
            Page::Boxplot => "Boxplot",
            Page::Heatmap => "Heatmap",
        }
    }
}

pub struct App {
    pub dashboard: Dashboard,
    pub playback: Playback,
    pub current_page: Page,
    pub region_state: TableState,
    pub point_state: TableState,
    pub show_detail: bool,
    /// Every gender value in the dataset, for the sex filter
    pub genders: Vec<String>,
    pub gender_cursor: usize,
}

impl App {
    pub fn new(dashboard: Dashboard, playback: Playback) -> Self {
        let mut region_state = TableState::default();
        region_state.select(Some(0));
        let mut point_state = TableState::default();
        point_state.select(Some(0));
        let genders = dashboard.dataset().genders();

        Self {
            dashboard,
            playback,
            current_page: Page::Globe,
            region_state,
            point_state,
            show_detail: false,
            genders,
            gender_cursor: 0,
        }
    }

    /// Regions in display order: ranked first, then unranked by name
    pub fn ordered_regions(&self) -> Vec<&RegionShade> {
        let mut regions: Vec<&RegionShade> = self
            .dashboard
            .scene()
            .regions
            .iter()
            .map(|(_, shade)| shade)
            .collect();
        regions.sort_by(|a, b| {
            a.rank
                .unwrap_or(usize::MAX)
                .cmp(&b.rank.unwrap_or(usize::MAX))
                .then_with(|| a.name.cmp(&b.name))
        });
        regions
    }

    pub fn selected_region_name(&self) -> Option<String> {
        let regions = self.ordered_regions();
        self.region_state
            .selected()
            .and_then(|i| regions.get(i))
            .map(|r| r.name.clone())
    }

    /// Record under the cursor in the points list of the current page
    pub fn selected_record(&self) -> Option<&Record> {
        let i = self.point_state.selected()?;
        let views = self.dashboard.views();
        let id = match self.current_page {
            Page::Globe => views.globe.points.get(i).map(|p| p.id.as_str()),
            _ => views.boxplot.points.get(i).map(|p| p.id.as_str()),
        }?;
        self.dashboard.dataset().record(id)
    }

    fn list_len(&self) -> usize {
        match self.current_page {
            Page::Globe if self.dashboard.filter().region.is_none() => {
                self.dashboard.dataset().regions().len()
            }
            Page::Globe => self.dashboard.views().globe.points.len(),
            Page::Boxplot => self.dashboard.views().boxplot.points.len(),
            Page::Heatmap => 0,
        }
    }

    fn list_state(&mut self) -> &mut TableState {
        if self.current_page == Page::Globe && self.dashboard.filter().region.is_none() {
            &mut self.region_state
        } else {
            &mut self.point_state
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
        self.point_state.select(Some(0));
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
        self.point_state.select(Some(0));
    }

    pub fn next(&mut self) {
        let len = self.list_len();
        if len == 0 {
            return;
        }
        let state = self.list_state();
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.list_len();
        if len == 0 {
            return;
        }
        let state = self.list_state();
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => (i - 1).min(len - 1),
        };
        state.select(Some(i));
    }

    /// Keep cursors in range after the lists changed size
    fn clamp_selection(&mut self) {
        let points = match self.current_page {
            Page::Globe => self.dashboard.views().globe.points.len(),
            _ => self.dashboard.views().boxplot.points.len(),
        };
        match (self.point_state.selected(), points) {
            (_, 0) => self.point_state.select(None),
            (Some(i), n) if i >= n => self.point_state.select(Some(n - 1)),
            (None, _) => self.point_state.select(Some(0)),
            _ => {}
        }
    }

    pub fn on_enter(&mut self) {
        if self.current_page == Page::Globe && self.dashboard.filter().region.is_none() {
            if let Some(name) = self.selected_region_name() {
                self.dashboard.click_region(&name);
                self.point_state.select(Some(0));
            }
        } else {
            self.toggle_detail();
        }
    }

    pub fn toggle_occupation(&mut self, category: OccupationCategory) {
        let next = self.dashboard.filter().toggle_occupation(category);
        self.dashboard.set_filter(next);
        self.clamp_selection();
    }

    pub fn toggle_gender(&mut self, gender: &str) {
        let next = self.dashboard.filter().toggle_gender(gender);
        self.dashboard.set_filter(next);
        self.clamp_selection();
    }

    pub fn focused_gender(&self) -> Option<&str> {
        self.genders.get(self.gender_cursor).map(String::as_str)
    }

    pub fn next_gender(&mut self) {
        if !self.genders.is_empty() {
            self.gender_cursor = (self.gender_cursor + 1) % self.genders.len();
        }
    }

    pub fn toggle_focused_gender(&mut self) {
        if let Some(gender) = self.focused_gender().map(str::to_string) {
            self.toggle_gender(&gender);
        }
    }

    pub fn clear_genders(&mut self) {
        let next = self.dashboard.filter().with_genders(Vec::<String>::new());
        self.dashboard.set_filter(next);
        self.clamp_selection();
    }

    pub fn clear_region(&mut self) {
        let next = self.dashboard.filter().clear_region();
        self.dashboard.set_filter(next);
        self.show_detail = false;
        self.clamp_selection();
    }

    pub fn reset_filters(&mut self) {
        let next = self.dashboard.filter().reset();
        self.dashboard.set_filter(next);
        self.show_detail = false;
        self.clamp_selection();
    }

    pub fn move_from_year(&mut self, delta: i32) {
        let years = self.dashboard.filter().years;
        let next = self.dashboard.filter().with_years(years.with_from(years.from() + delta));
        self.dashboard.set_filter(next);
        self.clamp_selection();
    }

    pub fn move_to_year(&mut self, delta: i32) {
        let years = self.dashboard.filter().years;
        let next = self.dashboard.filter().with_years(years.with_to(years.to() + delta));
        self.dashboard.set_filter(next);
        self.clamp_selection();
    }

    pub fn shift_years(&mut self, delta: i32) {
        let years = self.dashboard.filter().years.shifted(delta);
        let next = self.dashboard.filter().with_years(years);
        self.dashboard.set_filter(next);
        self.clamp_selection();
    }

    /// Timer tick: advance the window while playback runs
    pub fn on_tick(&mut self) {
        if let Some(years) = self.playback.tick(self.dashboard.filter().years) {
            let next = self.dashboard.filter().with_years(years);
            self.dashboard.set_filter(next);
            self.clamp_selection();
        }
    }

    /// Returns true when the app should quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Enter => self.on_enter(),
            KeyCode::Tab => self.next_page(),
            KeyCode::BackTab => self.previous_page(),
            KeyCode::Char(c @ '1'..='6') => {
                let index = (c as u8 - b'1') as usize;
                self.toggle_occupation(OccupationCategory::ALL[index]);
            }
            KeyCode::Char('g') => self.next_gender(),
            KeyCode::Char('s') => self.toggle_focused_gender(),
            KeyCode::Char('x') => self.clear_genders(),
            KeyCode::Char('[') => self.move_from_year(-YEAR_STEP),
            KeyCode::Char(']') => self.move_from_year(YEAR_STEP),
            KeyCode::Char('{') => self.move_to_year(-YEAR_STEP),
            KeyCode::Char('}') => self.move_to_year(YEAR_STEP),
            KeyCode::Left | KeyCode::Char('<') => self.shift_years(-YEAR_STEP),
            KeyCode::Right | KeyCode::Char('>') => self.shift_years(YEAR_STEP),
            KeyCode::Char('p') | KeyCode::Char(' ') => self.playback.toggle(),
            KeyCode::Char('r') => self.clear_region(),
            KeyCode::Char('c') => self.reset_filters(),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            _ => {}
        }
        false
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = app.playback.period().saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                        return Ok(());
                    }
                    if app.handle_key(key) {
                        return Ok(());
                    }
                }
            }
        }

        if last_tick.elapsed() >= app.playback.period() {
            app.on_tick();
            last_tick = Instant::now();
        }
    }
}

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Header with navigation + filter
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    let content = if app.show_detail {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);
        render_detail_panel(f, content_chunks[1], app);
        content_chunks[0]
    } else {
        chunks[1]
    };

    match app.current_page {
        Page::Globe => render_globe(f, content, app),
        Page::Boxplot => render_boxplot(f, content, app),
        Page::Heatmap => render_heatmap(f, content, app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Globe, Page::Boxplot, Page::Heatmap];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title(), style));
    }

    let views = app.dashboard.views();
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Matched: {}", views.matched),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(if app.playback.is_running() {
        Span::styled("▶ playing", Style::default().fg(Color::Green))
    } else {
        Span::styled("■ stopped", Style::default().fg(Color::DarkGray))
    });

    let filter = app.dashboard.filter();
    let mut filter_spans = vec![
        Span::styled("Years ", Style::default().fg(Color::Cyan)),
        Span::raw(filter.years.to_string()),
        Span::styled("  Region ", Style::default().fg(Color::Cyan)),
        Span::raw(filter.region.clone().unwrap_or_else(|| "all".to_string())),
        Span::styled("  Sex ", Style::default().fg(Color::Cyan)),
    ];
    if filter.genders.is_empty() {
        filter_spans.push(Span::raw("all "));
    }
    for (i, gender) in app.genders.iter().enumerate() {
        let mut style = if filter.genders.contains(gender) {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        if i == app.gender_cursor {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        filter_spans.push(Span::styled(format!("{} ", gender), style));
    }
    filter_spans.push(Span::styled("  Occupation ", Style::default().fg(Color::Cyan)));
    for (i, category) in OccupationCategory::ALL.iter().enumerate() {
        let active = filter.occupations.is_empty() || filter.occupations.contains(category);
        let style = if active {
            Style::default().fg(to_color(mortality_globe::palette::occupation_color(*category)))
        } else {
            Style::default().fg(Color::DarkGray)
        };
        filter_spans.push(Span::styled(format!("{}:{} ", i + 1, category.as_str()), style));
    }

    let header = Paragraph::new(vec![Line::from(tab_spans), Line::from(filter_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

// ============================================================================
// GLOBE
// ============================================================================

fn render_globe(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_world_map(f, chunks[0], app);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(12), Constraint::Min(0)])
        .split(chunks[1]);

    render_top_regions(f, side[0], app);

    if app.dashboard.filter().region.is_some() {
        render_globe_points(f, side[1], app);
    } else {
        render_region_table(f, side[1], app);
    }
}

fn render_world_map(f: &mut Frame, area: Rect, app: &App) {
    let dataset = app.dashboard.dataset();
    let hovered = app.selected_region_name();

    // One dot per ranked or selected region, at its centroid
    let region_dots: Vec<((f64, f64), Color)> = app
        .dashboard
        .scene()
        .regions
        .iter()
        .filter(|(_, shade)| shade.rank.is_some() || shade.selected)
        .filter_map(|(name, shade)| {
            let region = dataset.region(name)?;
            Some(((region.lng, region.lat), to_color(shade.cap_color_when(hovered.as_deref()))))
        })
        .collect();

    let hovered_point = app.selected_record().map(|r| r.id.clone());
    let record_dots: Vec<((f64, f64), Color)> = app
        .dashboard
        .scene()
        .globe_points
        .iter()
        .map(|(_, p)| ((p.lng, p.lat), to_color(p.color_when(hovered_point.as_deref()))))
        .collect();

    let camera = app.dashboard.camera();
    let title = format!(
        " Globe  (lat {:.1}, lng {:.1}, alt {:.2}) ",
        camera.lat, camera.lng, camera.altitude
    );

    let canvas = Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .x_bounds([-180.0, 180.0])
        .y_bounds([-90.0, 90.0])
        .paint(move |ctx| {
            ctx.draw(&Map {
                color: Color::DarkGray,
                resolution: MapResolution::Low,
            });
            ctx.layer();
            for (coords, color) in region_dots.iter().chain(record_dots.iter()) {
                ctx.draw(&Points {
                    coords: std::slice::from_ref(coords),
                    color: *color,
                });
            }
        });

    f.render_widget(canvas, area);
}

fn render_top_regions(f: &mut Frame, area: Rect, app: &App) {
    let lines: Vec<Line> = app
        .dashboard
        .views()
        .globe
        .top_regions
        .iter()
        .map(|r| {
            Line::from(vec![
                Span::styled(
                    format!("{:>2}. ", r.rank),
                    Style::default().fg(to_color(mortality_globe::palette::rank_color(r.rank))),
                ),
                Span::raw(format!("{} ({} records)", r.name, r.count)),
            ])
        })
        .collect();

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Top Regions "),
    );
    f.render_widget(paragraph, area);
}

fn render_region_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header = header_row(&["Rank", "Region", "Records"]);

    let rows: Vec<Row> = app
        .ordered_regions()
        .into_iter()
        .map(|shade| {
            let rank = shade
                .rank
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string());
            Row::new(vec![
                Cell::from(rank).style(Style::default().fg(to_color(shade.cap_color))),
                Cell::from(truncate(&shade.name, 28)),
                Cell::from(shade.count.to_string()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [Constraint::Length(6), Constraint::Length(30), Constraint::Length(10)],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Regions (Enter to select) "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.region_state);
}

fn render_globe_points(f: &mut Frame, area: Rect, app: &mut App) {
    let header = header_row(&["Name", "Occupation", "Years"]);

    let rows: Vec<Row> = app
        .dashboard
        .views()
        .globe
        .points
        .iter()
        .map(|p| {
            let record = app.dashboard.dataset().record(&p.id);
            let years = record
                .map(|r| format!("{}-{}", fmt_opt(r.birth_year), fmt_opt(r.death_year)))
                .unwrap_or_default();
            Row::new(vec![
                Cell::from(truncate(&p.name, 26)),
                Cell::from(p.category.map(|c| c.as_str()).unwrap_or("Unknown"))
                    .style(Style::default().fg(to_color(p.color))),
                Cell::from(years),
            ])
        })
        .collect();

    let title = format!(
        " {} - {} records (r clear) ",
        app.dashboard.filter().region.clone().unwrap_or_default(),
        app.dashboard.views().globe.points.len()
    );

    let table = Table::new(
        rows,
        [Constraint::Length(28), Constraint::Length(12), Constraint::Length(12)],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title))
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.point_state);
}

// ============================================================================
// BOXPLOT
// ============================================================================

/// One-line box-and-whisker glyph on a 0..AGE_AXIS_MAX axis
fn box_glyph(summary: &FiveNumberSummary, width: usize) -> String {
    let scale = |v: f64| -> usize {
        let t = (v / AGE_AXIS_MAX).clamp(0.0, 1.0);
        ((t * (width.saturating_sub(1)) as f64).round() as usize).min(width.saturating_sub(1))
    };

    let lo = scale(summary.display_lower_whisker());
    let hi = scale(summary.upper_whisker);
    let q1 = scale(summary.q1);
    let q3 = scale(summary.q3);
    let median = scale(summary.median);

    (0..width)
        .map(|i| {
            if i == median {
                '┃'
            } else if i >= q1 && i <= q3 {
                '█'
            } else if i >= lo && i <= hi {
                '─'
            } else {
                ' '
            }
        })
        .collect()
}

fn render_boxplot(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(0)])
        .split(area);

    let glyph_width = chunks[0].width.saturating_sub(62).max(10) as usize;
    let header = header_row(&["Occupation", "n", "Q1", "Median", "Q3", "Whiskers", "Age 0 → 120"]);

    let rows: Vec<Row> = app
        .dashboard
        .scene()
        .boxes
        .iter()
        .map(|(category, summary)| {
            let color = to_color(mortality_globe::palette::occupation_color(*category));
            let mut cells = vec![Cell::from(category.as_str()).style(Style::default().fg(color))];
            match summary {
                Some(s) => cells.extend([
                    Cell::from(s.count.to_string()),
                    Cell::from(format!("{:.1}", s.q1)),
                    Cell::from(format!("{:.1}", s.median)),
                    Cell::from(format!("{:.1}", s.q3)),
                    Cell::from(format!("{:.0}–{:.0}", s.display_lower_whisker(), s.upper_whisker)),
                    Cell::from(box_glyph(s, glyph_width)).style(Style::default().fg(color)),
                ]),
                None => cells.extend([
                    Cell::from("0"),
                    Cell::from("-"),
                    Cell::from("-"),
                    Cell::from("-"),
                    Cell::from("-"),
                    Cell::from("no data").style(Style::default().fg(Color::DarkGray)),
                ]),
            }
            Row::new(cells)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(11),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Length(10),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Age of Death by Occupation Category "),
    );
    f.render_widget(table, chunks[0]);

    let views = app.dashboard.views();
    let points_title = if views.boxplot.truncated {
        format!(" Points (first {}) ", views.boxplot.points.len())
    } else {
        format!(" Points ({}) ", views.boxplot.points.len())
    };

    let header = header_row(&["Name", "Occupation", "Age", "Jitter"]);
    let rows: Vec<Row> = views
        .boxplot
        .points
        .iter()
        .map(|p| {
            Row::new(vec![
                Cell::from(truncate(&p.name, 30)),
                Cell::from(p.category.as_str())
                    .style(Style::default().fg(to_color(mortality_globe::palette::occupation_color(p.category)))),
                Cell::from(format!("{:.0}", p.age)).style(Style::default().fg(to_color(p.color))),
                Cell::from(format!("{:.2}", p.jitter)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(32),
            Constraint::Length(12),
            Constraint::Length(6),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(points_title))
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, chunks[1], &mut app.point_state);
}

// ============================================================================
// HEATMAP
// ============================================================================

fn render_heatmap(f: &mut Frame, area: Rect, app: &App) {
    let scene = app.dashboard.scene();
    let views = app.dashboard.views();

    let mut header_cells = vec![Cell::from("")];
    header_cells.extend(OccupationCategory::ALL.iter().map(|c| {
        Cell::from(c.as_str()).style(
            Style::default()
                .fg(to_color(mortality_globe::palette::occupation_color(*c)))
                .add_modifier(Modifier::BOLD),
        )
    }));
    let header = Row::new(header_cells).height(1);

    let mut totals = vec![Cell::from("All").style(Style::default().add_modifier(Modifier::BOLD))];
    totals.extend(
        views
            .heatmap
            .occupation_totals
            .iter()
            .map(|t| Cell::from(t.count.to_string()).style(Style::default().fg(to_color(t.color)))),
    );

    let mut rows = vec![Row::new(totals).height(1)];
    for death in DeathCategory::ALL {
        let mut cells = vec![Cell::from(death.as_str())];
        for occupation in OccupationCategory::ALL {
            let cell = match scene.cells.get(&(occupation, death)) {
                Some(cell) => Cell::from(format!("{} ({})", cell.count, cell.percent_label()))
                    .style(Style::default().bg(to_color(cell.color)).fg(Color::Black)),
                None => Cell::from("-"),
            };
            cells.push(cell);
        }
        rows.push(Row::new(cells).height(2));
    }

    let mut widths = vec![Constraint::Length(28)];
    widths.extend(std::iter::repeat(Constraint::Length(12)).take(OccupationCategory::ALL.len()));

    let title = format!(
        " Occupational Mortality Distribution ☠️  ({} classified, {} unclassified) ",
        views.heatmap.total, views.heatmap.unclassified
    );

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(title),
        );

    f.render_widget(table, area);
}

// ============================================================================
// DETAIL + STATUS
// ============================================================================

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let record = match app.selected_record() {
        Some(r) => r,
        None => {
            let no_selection = Paragraph::new("No record selected").block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(" Record Details "),
            );
            f.render_widget(no_selection, area);
            return;
        }
    };

    let mut content = vec![Line::from("")];
    for line in record.tooltip().lines() {
        let (label, value) = line.split_once(": ").unwrap_or((line, ""));
        content.push(Line::from(vec![
            Span::styled(
                format!("  {}: ", label),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw(wrap_text(value, 35)),
        ]));
    }
    content.push(Line::from(""));
    content.push(Line::from("  ─────────────────────────────────────"));
    content.push(Line::from(""));
    content.push(Line::from(vec![Span::styled(
        "  LINK",
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    )]));
    content.push(Line::from(vec![
        Span::raw("  "),
        Span::styled(record.link(), Style::default().fg(Color::Green)),
    ]));
    content.push(Line::from(""));
    content.push(Line::from(vec![Span::styled(
        "  Press Enter to close",
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    )]));

    let detail_panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Record Details "),
    );

    f.render_widget(detail_panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));

    let mut status_spans = vec![
        key("1-6"),
        Span::raw(" Occupation | "),
        key("g/s/x"),
        Span::raw(" Sex | "),
        key("[ ] { }"),
        Span::raw(" Years | "),
        key("←/→"),
        Span::raw(" Shift | "),
        key("p"),
        Span::raw(if app.playback.is_running() { " Stop | " } else { " Play | " }),
        key("Enter"),
        Span::raw(" Select | "),
        key("Tab"),
        Span::raw(" Page | "),
        key("c"),
        Span::raw(" Reset | "),
    ];
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });
    Row::new(cells).style(Style::default().bg(Color::DarkGray)).height(1)
}

fn fmt_opt(year: Option<i32>) -> String {
    year.map(|y| y.to_string()).unwrap_or_else(|| "?".to_string())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

fn wrap_text(text: &str, width: usize) -> String {
    if text.len() <= width {
        text.to_string()
    } else {
        let mut result = String::new();
        let mut current_line = String::new();

        for word in text.split_whitespace() {
            if current_line.len() + word.len() + 1 <= width {
                if !current_line.is_empty() {
                    current_line.push(' ');
                }
                current_line.push_str(word);
            } else {
                if !result.is_empty() {
                    result.push_str("\n    ");
                }
                result.push_str(&current_line);
                current_line = word.to_string();
            }
        }

        if !current_line.is_empty() {
            if !result.is_empty() {
                result.push_str("\n    ");
            }
            result.push_str(&current_line);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mortality_globe::{Dataset, FilterState, ViewOptions, YearRange};

    #[test]
    fn test_box_glyph_marks_median() {
        let summary = FiveNumberSummary::from_values(&[30.0, 60.0, 90.0]).unwrap();
        let glyph = box_glyph(&summary, 13);
        assert_eq!(glyph.chars().count(), 13);
        assert_eq!(glyph.chars().nth(6), Some('┃'));
        assert!(glyph.contains('█'));
    }

    fn app() -> App {
        let records = vec![
            Record::new("1", "Ada").with_origin("Female", "France").with_lifespan(1815, 1852),
            Record::new("2", "Hugo").with_origin("Male", "France").with_lifespan(1802, 1885),
            Record::new("3", "Sam").with_origin("Non-binary", "France").with_lifespan(1850, 1900),
        ];
        let dataset = Dataset::new(records, vec![]);
        let filter = FilterState::new(YearRange::new(1800, 1900).unwrap());
        App::new(
            Dashboard::new(dataset, filter, ViewOptions::default()),
            Playback::default(),
        )
    }

    fn press(app: &mut App, c: char) -> bool {
        app.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    #[test]
    fn test_every_dataset_gender_is_selectable() {
        let mut app = app();
        assert_eq!(app.genders, vec!["Female", "Male", "Non-binary"]);
        assert_eq!(app.dashboard.views().matched, 3);

        press(&mut app, 'g');
        press(&mut app, 'g');
        assert_eq!(app.focused_gender(), Some("Non-binary"));
        press(&mut app, 's');
        assert!(app.dashboard.filter().genders.contains("Non-binary"));
        assert_eq!(app.dashboard.views().matched, 1);

        press(&mut app, 's');
        assert!(app.dashboard.filter().genders.is_empty());

        press(&mut app, 'g');
        assert_eq!(app.focused_gender(), Some("Female"));
        press(&mut app, 's');
        press(&mut app, 'x');
        assert_eq!(app.dashboard.views().matched, 3);
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        assert!(!press(&mut app, 'g'));
        assert!(press(&mut app, 'q'));
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("Ōsaka Castle Park", 8), "Ōsaka...");
        assert_eq!(truncate("short", 8), "short");
    }
}
