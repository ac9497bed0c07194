//! Ratatui-based terminal UI.
//!
//! Three views share one event loop: the bond browser (search, detail, impact
//! mode), the disclosure analyzer, and the market view with the price chart.
//! Requests run on the tokio runtime; their results come back over a channel
//! and are applied to the sessions on this thread only.

mod draw;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::chart::{ChartManager, PriceChartFactory};
use crate::config::Settings;
use crate::data::{HttpApi, PrismApi};
use crate::domain::{
    AnalysisResult, AnalyzeRequest, BondDetail, BondRecord, MarketSummary, PricePoint,
    RuleRecompute,
};
use crate::error::{AnalysisFailed, ApiError, AppError};
use crate::session::market::MarketRequests;
use crate::session::{
    AnalysisSession, BondSession, MarketKey, MarketSession, Resolution, Ticket, analysis, bonds,
    market,
};
use crate::theme::{ThemeContext, terminal_prefers_dark};

/// Start the TUI.
pub fn run(settings: &Settings, api: HttpApi, handle: Handle) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let (tx, rx) = mpsc::unbounded_channel();
    let driver = Driver {
        api: Arc::new(api),
        handle,
        tx,
    };

    let colorfgbg = std::env::var("COLORFGBG").ok();
    let theme = ThemeContext::init(
        settings.theme.as_deref(),
        terminal_prefers_dark(colorfgbg.as_deref()),
    );

    let mut app = App::new(theme, settings.bond_limit);
    app.event_loop(&mut terminal, &driver, rx)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// A fetch the UI wants performed.
#[derive(Debug)]
enum Request {
    List(Ticket<usize>),
    Detail(Ticket<String>),
    Rule(Ticket<String>),
    Analysis(Ticket<AnalyzeRequest>),
    Market(MarketRequests),
}

/// A finished fetch, still tagged with the ticket it was issued under.
#[derive(Debug)]
enum Response {
    List(Ticket<usize>, Result<Vec<BondRecord>, ApiError>),
    Detail(Ticket<String>, Result<BondDetail, ApiError>),
    Rule(Ticket<String>, Result<RuleRecompute, ApiError>),
    Analysis(Ticket<AnalyzeRequest>, Result<AnalysisResult, AnalysisFailed>),
    Series(Ticket<MarketKey>, Vec<PricePoint>),
    Summary(Ticket<MarketKey>, Option<MarketSummary>),
}

/// Runs requests on the async runtime and posts the results back.
struct Driver {
    api: Arc<dyn PrismApi>,
    handle: Handle,
    tx: UnboundedSender<Response>,
}

impl Driver {
    fn dispatch(&self, request: Request) {
        match request {
            Request::List(t) => self.spawn(|api, tx| async move {
                let (t, r) = bonds::load_list(api.as_ref(), t).await;
                let _ = tx.send(Response::List(t, r));
            }),
            Request::Detail(t) => self.spawn(|api, tx| async move {
                let (t, r) = bonds::load_detail(api.as_ref(), t).await;
                let _ = tx.send(Response::Detail(t, r));
            }),
            Request::Rule(t) => self.spawn(|api, tx| async move {
                let (t, r) = bonds::load_rule(api.as_ref(), t).await;
                let _ = tx.send(Response::Rule(t, r));
            }),
            Request::Analysis(t) => self.spawn(|api, tx| async move {
                let (t, r) = analysis::load_analysis(api.as_ref(), t).await;
                let _ = tx.send(Response::Analysis(t, r));
            }),
            Request::Market(MarketRequests { series, summary }) => {
                self.spawn(|api, tx| async move {
                    let (t, prices) = market::load_series(api.as_ref(), series).await;
                    let _ = tx.send(Response::Series(t, prices));
                });
                self.spawn(|api, tx| async move {
                    let (t, latest) = market::load_summary(api.as_ref(), summary).await;
                    let _ = tx.send(Response::Summary(t, latest));
                });
            }
        }
    }

    fn spawn<F, Fut>(&self, task: F)
    where
        F: FnOnce(Arc<dyn PrismApi>, UnboundedSender<Response>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(task(Arc::clone(&self.api), self.tx.clone()));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Bonds,
    Analyzer,
    Market,
}

impl View {
    const ALL: [View; 3] = [View::Bonds, View::Analyzer, View::Market];

    fn title(self) -> &'static str {
        match self {
            View::Bonds => "Bonds",
            View::Analyzer => "Analyzer",
            View::Market => "Market",
        }
    }

    fn next(self) -> Self {
        match self {
            View::Bonds => View::Analyzer,
            View::Analyzer => View::Market,
            View::Market => View::Bonds,
        }
    }

    fn prev(self) -> Self {
        match self {
            View::Bonds => View::Market,
            View::Analyzer => View::Bonds,
            View::Market => View::Analyzer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Search,
    Text,
    Claimed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Normal,
    Editing(Field),
}

struct App {
    view: View,
    input: Input,
    theme: ThemeContext,
    bond_limit: usize,
    bonds: BondSession,
    cursor: usize,
    analysis: AnalysisSession,
    market: MarketSession,
    /// Remembered across visits to the market view.
    market_key: MarketKey,
    chart: ChartManager<PriceChartFactory>,
    /// Columns outside the chart surface, for mapping terminal resizes.
    chart_margin: Option<u16>,
    status: String,
    outbox: Vec<Request>,
}

impl App {
    fn new(theme: ThemeContext, bond_limit: usize) -> Self {
        Self {
            view: View::Bonds,
            input: Input::Normal,
            theme,
            bond_limit,
            bonds: BondSession::default(),
            cursor: 0,
            analysis: AnalysisSession::new(),
            market: MarketSession::new(),
            market_key: MarketKey::default(),
            chart: ChartManager::new(PriceChartFactory),
            chart_margin: None,
            status: "Loading bonds...".to_string(),
            outbox: Vec::new(),
        }
    }

    fn start(&mut self) {
        let ticket = self.bonds.request_list(self.bond_limit);
        self.outbox.push(Request::List(ticket));
    }

    fn flush(&mut self, driver: &Driver) {
        for request in std::mem::take(&mut self.outbox) {
            driver.dispatch(request);
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        driver: &Driver,
        mut rx: UnboundedReceiver<Response>,
    ) -> Result<(), AppError> {
        self.start();
        let mut needs_redraw = true;
        loop {
            self.flush(driver);
            while let Ok(response) = rx.try_recv() {
                self.apply(response);
                needs_redraw = true;
            }
            self.flush(driver);

            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(width, _) => {
                    if let Some(margin) = self.chart_margin {
                        self.chart.on_resize(width.saturating_sub(margin));
                    }
                    needs_redraw = true;
                }
                _ => {}
            }
        }

        self.chart.unmount();
        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }
        if let Input::Editing(field) = self.input {
            self.edit(field, key.code);
            return false;
        }
        // The failure notice is modal.
        if self.view == View::Analyzer && self.analysis.failure().is_some() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('x')) {
                self.analysis.dismiss_failure();
            }
            return false;
        }

        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Tab => self.switch_view(self.view.next()),
            KeyCode::BackTab => self.switch_view(self.view.prev()),
            KeyCode::Char('1') => self.switch_view(View::Bonds),
            KeyCode::Char('2') => self.switch_view(View::Analyzer),
            KeyCode::Char('3') => self.switch_view(View::Market),
            KeyCode::Char('t') => {
                let theme = self.theme.toggle();
                self.status = format!("Theme: {theme}");
            }
            code => match self.view {
                View::Bonds => self.bonds_key(code),
                View::Analyzer => self.analyzer_key(code),
                View::Market => self.market_key(code),
            },
        }
        false
    }

    fn edit(&mut self, field: Field, code: KeyCode) {
        match code {
            KeyCode::Esc | KeyCode::Enter => self.input = Input::Normal,
            KeyCode::Backspace => match field {
                Field::Search => self.bonds.pop_query_char(),
                Field::Text => self.analysis.pop_text_char(),
                Field::Claimed => self.analysis.pop_claimed_char(),
            },
            KeyCode::Char(c) => match field {
                Field::Search => self.bonds.push_query_char(c),
                Field::Text => self.analysis.push_text_char(c),
                Field::Claimed => self.analysis.push_claimed_char(c),
            },
            _ => {}
        }
        if field == Field::Search {
            self.cursor = 0;
        }
    }

    fn switch_view(&mut self, to: View) {
        if to == self.view {
            return;
        }
        if self.view == View::Market {
            self.market.reset();
            self.chart.unmount();
            self.chart_margin = None;
        }
        self.view = to;
        if to == View::Market {
            if let Some(requests) = self.market.select(self.market_key.clone()) {
                self.queue_market(requests);
            }
        }
    }

    fn bonds_key(&mut self, code: KeyCode) {
        let shown = self.bonds.visible().shown.len();
        match code {
            KeyCode::Char('/') => self.input = Input::Editing(Field::Search),
            KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down => {
                if self.cursor + 1 < shown {
                    self.cursor += 1;
                }
            }
            KeyCode::PageUp => self.cursor = self.cursor.saturating_sub(10),
            KeyCode::PageDown => self.cursor = (self.cursor + 10).min(shown.saturating_sub(1)),
            KeyCode::Enter => {
                let id = self.bonds.visible().shown.get(self.cursor).map(|b| b.id.clone());
                if let Some(ticket) = id.and_then(|id| self.bonds.select(&id)) {
                    self.outbox.push(Request::Detail(ticket));
                }
            }
            KeyCode::Esc => self.bonds.deselect(),
            KeyCode::Char('m') => {
                let mode = self.bonds.impact_mode().next();
                if let Some(ticket) = self.bonds.set_impact_mode(mode) {
                    self.outbox.push(Request::Rule(ticket));
                }
                self.status = format!("Impact mode: {}", mode.display_name());
            }
            KeyCode::Char('r') => {
                let ticket = self.bonds.request_list(self.bond_limit);
                self.outbox.push(Request::List(ticket));
                self.status = "Reloading bonds...".to_string();
            }
            _ => {}
        }
    }

    fn analyzer_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('i') | KeyCode::Char('e') => self.input = Input::Editing(Field::Text),
            KeyCode::Char('c') => self.input = Input::Editing(Field::Claimed),
            KeyCode::Char('m') => {
                let mode = self.analysis.mode().next();
                self.analysis.set_mode(mode);
                self.status = format!("Analysis mode: {}", mode.display_name());
            }
            KeyCode::Enter | KeyCode::Char('r') => match self.analysis.submit() {
                Some(ticket) => {
                    self.outbox.push(Request::Analysis(ticket));
                    self.status = "Analyzing...".to_string();
                }
                None if self.analysis.is_loading() => {
                    self.status = "Analysis already running.".to_string();
                }
                None => self.status = "Enter disclosure text first (i to edit).".to_string(),
            },
            _ => {}
        }
    }

    fn market_key(&mut self, code: KeyCode) {
        let requests = match code {
            KeyCode::Left => self.market.select_horizon(self.market_key.horizon.prev()),
            KeyCode::Right => self.market.select_horizon(self.market_key.horizon.next()),
            KeyCode::Char('i') => self.market.next_instrument(),
            _ => None,
        };
        if let Some(requests) = requests {
            self.queue_market(requests);
        }
    }

    fn queue_market(&mut self, requests: MarketRequests) {
        self.market_key = requests.series.key().clone();
        self.chart.set_data(self.market.prices());
        self.outbox.push(Request::Market(requests));
    }

    fn apply(&mut self, response: Response) {
        match response {
            Response::List(t, r) => {
                match self.bonds.apply_list(&t, r) {
                    Resolution::Applied => {
                        self.status = format!("Loaded {} bonds.", self.bonds.bonds().len());
                    }
                    Resolution::Degraded(reason) => {
                        self.status = format!("Bond list unavailable: {reason}");
                    }
                    Resolution::Discarded => {}
                }
                let shown = self.bonds.visible().shown.len();
                self.cursor = self.cursor.min(shown.saturating_sub(1));
            }
            Response::Detail(t, r) => {
                let applied = self.bonds.apply_detail(&t, r);
                if let Some(recompute) = applied.recompute {
                    self.outbox.push(Request::Rule(recompute));
                }
                if let Resolution::Degraded(reason) = applied.resolution {
                    self.status = format!("Bond detail unavailable: {reason}");
                }
            }
            Response::Rule(t, r) => {
                if let Resolution::Degraded(reason) = self.bonds.apply_rule(&t, r) {
                    self.status = format!("Rule recompute unavailable: {reason}");
                }
            }
            Response::Analysis(t, r) => match self.analysis.apply(&t, r) {
                Resolution::Applied => self.status = "Analysis complete.".to_string(),
                Resolution::Degraded(reason) => self.status = reason,
                Resolution::Discarded => {}
            },
            Response::Series(t, prices) => {
                if self.market.apply_series(&t, prices) != Resolution::Discarded {
                    self.chart.set_data(self.market.prices());
                }
            }
            Response::Summary(t, latest) => {
                self.market.apply_summary(&t, latest);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartState;
    use crate::domain::{Horizon, ImpactEstimate, Mode, ScoreBundle};
    use ratatui::backend::TestBackend;

    fn app() -> App {
        let mut app = App::new(ThemeContext::init(Some("dark"), false), 5000);
        app.start();
        app
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn bond(id: &str, issuer: &str) -> BondRecord {
        BondRecord {
            id: id.to_string(),
            issuer_name: issuer.to_string(),
            currency: "EUR".to_string(),
            ..BondRecord::default()
        }
    }

    fn load_bonds(app: &mut App, bonds: Vec<BondRecord>) {
        let Some(Request::List(t)) = app.outbox.pop() else {
            panic!("expected a list request");
        };
        app.apply(Response::List(t, Ok(bonds)));
    }

    #[test]
    fn startup_requests_list_with_limit() {
        let app = app();
        assert!(matches!(app.outbox.as_slice(), [Request::List(t)] if *t.key() == 5000));
    }

    #[test]
    fn select_then_detail_then_recompute() {
        let mut app = app();
        load_bonds(&mut app, vec![bond("A", "Acme"), bond("B", "Borealis")]);

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        let Some(Request::Detail(t)) = app.outbox.pop() else {
            panic!("expected a detail request");
        };
        assert_eq!(t.key(), "B");

        let detail = BondDetail {
            bond: bond("B", "Borealis"),
            scores: ScoreBundle::default(),
        };
        app.apply(Response::Detail(t, Ok(detail)));
        let Some(Request::Rule(r)) = app.outbox.pop() else {
            panic!("expected a rule recompute");
        };
        app.apply(Response::Rule(
            r,
            Ok(RuleRecompute {
                impact_prediction_rule: Some(ImpactEstimate {
                    predicted: Some(5.0),
                    ..ImpactEstimate::default()
                }),
            }),
        ));
        assert_eq!(app.bonds.impact().and_then(|i| i.predicted), Some(5.0));
    }

    #[test]
    fn search_editing_does_not_quit() {
        let mut app = app();
        load_bonds(&mut app, vec![bond("A", "Acme"), bond("B", "Borealis")]);

        press(&mut app, KeyCode::Char('/'));
        type_text(&mut app, "quiet");
        assert_eq!(app.bonds.query(), "quiet");
        press(&mut app, KeyCode::Esc);
        assert!(press(&mut app, KeyCode::Char('q')));
    }

    #[test]
    fn impact_mode_toggle_leaves_rule_mode() {
        let mut app = app();
        press(&mut app, KeyCode::Char('m'));
        assert_eq!(app.bonds.impact_mode(), Mode::Ml);
        assert!(app.outbox.iter().all(|r| !matches!(r, Request::Rule(_))));
    }

    #[test]
    fn analyzer_submits_once_while_loading() {
        let mut app = app();
        app.outbox.clear();
        press(&mut app, KeyCode::Char('2'));
        press(&mut app, KeyCode::Enter);
        assert!(app.outbox.is_empty());

        press(&mut app, KeyCode::Char('i'));
        type_text(&mut app, "Wind farm");
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('c'));
        type_text(&mut app, "12x");
        press(&mut app, KeyCode::Enter);

        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.outbox.len(), 1);
        let Some(Request::Analysis(t)) = app.outbox.pop() else {
            panic!("expected an analysis request");
        };
        assert_eq!(t.key().text, "Wind farm");
        assert_eq!(t.key().claimed_impact_co2_tons, None);
    }

    #[test]
    fn failure_notice_is_modal() {
        let mut app = app();
        press(&mut app, KeyCode::Char('2'));
        app.analysis.set_text("Solar");
        press(&mut app, KeyCode::Enter);
        let Some(Request::Analysis(t)) = app.outbox.pop() else {
            panic!("expected an analysis request");
        };
        let err = AnalysisFailed(ApiError::Status {
            endpoint: "analyze_text".to_string(),
            status: 502,
        });
        app.apply(Response::Analysis(t, Err(err)));
        assert!(app.analysis.failure().is_some());

        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.view, View::Analyzer);
        press(&mut app, KeyCode::Char('x'));
        assert!(app.analysis.failure().is_none());
    }

    #[test]
    fn market_view_requests_and_resets() {
        let mut app = app();
        app.outbox.clear();
        press(&mut app, KeyCode::Char('3'));
        let Some(Request::Market(first)) = app.outbox.pop() else {
            panic!("expected market requests");
        };
        assert_eq!(first.series.key().horizon, Horizon::OneYear);

        press(&mut app, KeyCode::Left);
        let Some(Request::Market(second)) = app.outbox.pop() else {
            panic!("expected market requests");
        };
        assert_eq!(app.market_key.horizon, Horizon::SixMonths);

        app.apply(Response::Series(first.series, Vec::new()));
        assert!(app.market.is_series_loading());
        app.apply(Response::Series(second.series, Vec::new()));
        assert!(!app.market.is_series_loading());

        press(&mut app, KeyCode::Char('1'));
        assert!(app.market.key().is_none());
        assert_ne!(app.chart.state(), ChartState::Ready);

        press(&mut app, KeyCode::Char('3'));
        let Some(Request::Market(again)) = app.outbox.pop() else {
            panic!("expected market requests");
        };
        assert_eq!(again.series.key().horizon, Horizon::SixMonths);
    }

    #[test]
    fn bonds_view_renders_counts() {
        let mut app = app();
        load_bonds(&mut app, vec![bond("A", "Acme"), bond("B", "Borealis")]);

        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect();
        assert!(text.contains("Showing 2 of 2 matching bonds"));
        assert!(text.contains("Borealis"));
    }
}
