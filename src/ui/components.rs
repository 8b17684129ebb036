use crate::model::Category;
use crate::ui::app::{App, AppState, InputKind};
use humansize::{BINARY, format_size};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap},
};
use std::fmt::Write as _;

pub fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let root = app.registry.workspace().root();
    let disk_info = app
        .disks
        .list()
        .iter()
        .filter(|d| root.starts_with(d.mount_point()))
        .max_by_key(|d| d.mount_point().as_os_str().len());

    let header_text = if let Some(disk) = disk_info {
        format!(
            "devspace v{} | {} | Free: {} / {}",
            env!("CARGO_PKG_VERSION"),
            root.display(),
            format_size(disk.available_space(), BINARY),
            format_size(disk.total_space(), BINARY)
        )
    } else {
        format!(
            "devspace v{} | {} | Disk: N/A",
            env!("CARGO_PKG_VERSION"),
            root.display()
        )
    };

    let title = Paragraph::new(header_text).block(Block::default().borders(Borders::ALL));
    f.render_widget(title, area);
}

pub fn render_tabs(f: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<&str> = Category::ALL.iter().map(Category::name).collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL))
        .select(app.tab)
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .fg(Color::Yellow),
        );
    f.render_widget(tabs, area);
}

pub fn render_projects_list(f: &mut Frame, app: &mut App, area: Rect) {
    let items: Vec<ListItem> = app
        .projects
        .iter()
        .map(|p| {
            let icon = if p.is_dir { "[D]" } else { "[F]" };
            let size_str = app
                .stats
                .get(&p.path)
                .map_or_else(|| "...".to_string(), |s| format_size(s.size, BINARY));
            let content = format!("{icon} {:<28} {:>10}", p.name, size_str);
            if p.is_external() {
                ListItem::new(format!("{content}  (external)"))
                    .style(Style::default().fg(Color::DarkGray))
            } else {
                ListItem::new(content)
            }
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(app.category().name().to_string()),
        )
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .fg(Color::Yellow),
        )
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut app.list_state);
}

pub fn render_details(f: &mut Frame, app: &App, area: Rect) {
    let Some(project) = app.selected() else {
        let empty = Paragraph::new(format!(
            "No projects in {}.\n\n[a] add an external folder  [n] create a new project",
            app.registry.workspace().dir(app.category()).display()
        ))
        .block(Block::default().borders(Borders::ALL).title("Details"))
        .wrap(Wrap { trim: false });
        f.render_widget(empty, area);
        return;
    };

    let mut details_text = format!("Path: {}\n", project.path.display());
    let source = if project.is_external() {
        "external (not yet in workspace)"
    } else {
        "workspace"
    };
    let _ = writeln!(details_text, "Source: {source}");
    if let Some(stats) = app.stats.get(&project.path) {
        let _ = writeln!(
            details_text,
            "Size: {} in {} file(s)",
            format_size(stats.size, BINARY),
            stats.files
        );
    }
    let _ = write!(details_text, "\n{}", app.preview);

    let details = Paragraph::new(details_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Details: {}", project.name)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(details, area);
}

pub fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let footer_text = match app.state {
        AppState::Browsing => {
            let keys = "[Enter] Run [a] Add [m] Move to Projects [n] New [e] Edit [d] Delete [r] Refresh [Tab] Next [q] Quit";
            match &app.status {
                Some(status) => format!("{status} | {keys}"),
                None => keys.to_string(),
            }
        }
        AppState::Input(_) => "[Enter] Confirm [Esc] Cancel".to_string(),
        AppState::ConfirmMoveAll(count) => {
            format!("MOVE {count} external item(s) to projects? | [y/Enter] Confirm [n/Esc] Cancel")
        }
        AppState::ConfirmOverwrite(ref project) => format!(
            "{} already exists in destination. Replace it? | [y] Replace [n] Skip",
            project.name
        ),
        AppState::ConfirmTrash(ref project) => {
            format!("DELETE {}? | [y] Confirm [n/Esc] Cancel", project.name)
        }
        AppState::Done(_) => "[Press key to continue]".to_string(),
    };

    let footer = Paragraph::new(footer_text).block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, area);
}

pub fn render_popup(f: &mut Frame, app: &App) {
    let (title, body) = match app.state {
        AppState::Done(ref msg) => ("devspace", msg.clone()),
        AppState::Input(InputKind::AddExternal) => {
            ("Add external path", format!("{}_", app.input))
        }
        AppState::Input(InputKind::NewProject) => ("New project name", format!("{}_", app.input)),
        _ => return,
    };

    let block = Block::default().title(title).borders(Borders::ALL);
    let area = centered_rect(60, 20, f.area());
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(body).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
