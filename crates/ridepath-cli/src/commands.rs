//! Subcommand handlers

use crate::cli::{Command, PositionArgs};
use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveTime;
use ridepath_core::format::{calculate_eta_time, format_eta};
use ridepath_core::{City, RideType, RouteCities, Stop, StopStatus};
use ridepath_driver::{DriverServices, RouteTraversal, UrlOpener};
use std::time::Duration;

/// Prints the link instead of launching a maps app
struct StdoutOpener;

impl UrlOpener for StdoutOpener {
    fn open(&self, url: &str) -> Result<(), String> {
        println!("{url}");
        Ok(())
    }
}

pub(crate) async fn run(command: Command, services: &DriverServices) -> Result<()> {
    match command {
        Command::RouteCities { refresh } => route_cities(services, refresh).await,
        Command::Today(position) => today(services, position).await,
        Command::Complete { position, notes } => complete(services, position, &notes).await,
        Command::Navigate(position) => navigate(services, position).await,
        Command::Search { query } => search(services, &query).await,
        Command::Setup {
            cities,
            ride_type,
            start,
            end,
        } => setup(services, &cities, ride_type, start, end).await,
        Command::Chats {
            conversation,
            watch,
        } => chats(services, conversation, Duration::from_secs(watch)).await,
    }
}

async fn route_cities(services: &DriverServices, refresh: bool) -> Result<()> {
    let resolver = services.resolver();
    let resolved = if refresh {
        resolver.refresh().await
    } else {
        resolver.resolve().await
    };

    match resolved {
        Some(route) => println!("{}", describe_route(&route)),
        None => println!("No route configured"),
    }
    Ok(())
}

async fn load(services: &DriverServices, position: PositionArgs) -> Result<RouteTraversal> {
    let traversal = services.traversal();
    traversal
        .load(position.coordinates())
        .await
        .map_err(|e| anyhow!(e.user_message()))?;
    if traversal.summary().is_some_and(|s| s.degraded) {
        println!("Note: route is not fully optimized");
    }
    Ok(traversal)
}

async fn today(services: &DriverServices, position: PositionArgs) -> Result<()> {
    let traversal = load(services, position).await?;
    let stops = traversal.stops();
    if stops.is_empty() {
        println!("No stops today");
        return Ok(());
    }

    let current = traversal.current_index();
    for (index, stop) in stops.iter().enumerate() {
        let marker = if index == current { '>' } else { ' ' };
        println!(
            "{marker} {}. {}",
            index + 1,
            stop_line(stop, &traversal.stop_eta_label(stop))
        );
    }
    if let Some(summary) = traversal.summary() {
        println!(
            "Total: {:.1} km, {}",
            summary.total_distance_meters as f64 / 1000.0,
            format_eta(summary.total_duration_secs / 60)
        );
    }
    Ok(())
}

async fn complete(services: &DriverServices, position: PositionArgs, notes: &str) -> Result<()> {
    let traversal = load(services, position).await?;
    let stop = traversal
        .current()
        .ok_or_else(|| anyhow!("No stop left to complete"))?;

    traversal
        .mark_current_complete(notes)
        .await
        .map_err(|e| anyhow!(e.user_message()))?;

    println!("Completed {} at {}", stop.display_name(), stop.address);
    match traversal.current() {
        Some(next) => println!(
            "Next: {}",
            stop_line(&next, &traversal.stop_eta_label(&next))
        ),
        None => println!("Route completed"),
    }
    Ok(())
}

async fn navigate(services: &DriverServices, position: PositionArgs) -> Result<()> {
    let traversal = load(services, position).await?;
    let stop = traversal
        .current()
        .ok_or_else(|| anyhow!("No stop to navigate to"))?;
    traversal.open_external_navigation(&stop, &StdoutOpener)?;
    Ok(())
}

async fn search(services: &DriverServices, query: &str) -> Result<()> {
    let form = services.route_setup();
    form.search_cities(query).await;
    if let Some(error) = form.search_error() {
        bail!(error);
    }
    for city in form.search_results() {
        println!("{:>6}  {}", city.id, city.name);
    }
    Ok(())
}

async fn setup(
    services: &DriverServices,
    names: &[String],
    ride_type: RideType,
    start: NaiveTime,
    end: NaiveTime,
) -> Result<()> {
    let form = services.route_setup();
    for name in names {
        form.search_cities(name).await;
        let city = pick_city(name, &form.search_results())
            .with_context(|| format!("no city matches {name:?}"))?;
        if !form.add_city(city) {
            println!("Skipping duplicate city {name:?}");
        }
    }

    form.submit(ride_type, start, end)
        .await
        .map_err(|e| anyhow!(e.user_message()))?;

    let route: Vec<String> = form.selected_cities().into_iter().map(|c| c.name).collect();
    println!("Saved {ride_type} route: {}", route.join(" -> "));
    Ok(())
}

async fn chats(services: &DriverServices, conversation: Option<i64>, watch: Duration) -> Result<()> {
    match conversation {
        Some(id) => {
            let poller = services.chat_room(id);
            poll_and_print(&poller, watch, |messages| {
                for message in messages {
                    println!(
                        "[{}] {}: {}",
                        message.sent_at.format("%H:%M"),
                        message.sender_id,
                        message.body
                    );
                }
            })
            .await
        }
        None => {
            let poller = services.chat_list();
            poll_and_print(&poller, watch, |conversations| {
                for c in conversations {
                    let unread = if c.unread_count > 0 {
                        format!(" ({} unread)", c.unread_count)
                    } else {
                        String::new()
                    };
                    println!("{:>6}  {}{}", c.id, c.title, unread);
                }
            })
            .await
        }
    }
}

async fn poll_and_print<T, F>(
    poller: &ridepath_driver::ChatPoller<T>,
    watch: Duration,
    print: F,
) -> Result<()>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(&T),
{
    let mut rx = poller.subscribe();
    if !poller.focus() {
        bail!("could not start polling");
    }

    let first_wait = poller.interval() * 2;
    tokio::time::timeout(first_wait, rx.changed())
        .await
        .context("no response from chat service")??;
    if let Some(snapshot) = poller.latest() {
        print(&snapshot);
    }

    let deadline = tokio::time::Instant::now() + watch;
    while tokio::time::timeout_at(deadline, rx.changed()).await.is_ok() {
        if let Some(snapshot) = poller.latest() {
            println!("--");
            print(&snapshot);
        }
    }

    poller.blur();
    Ok(())
}

fn describe_route(route: &RouteCities) -> String {
    let mut line = format!("{} -> {}", route.start_point, route.end_point);
    if let Some(minutes) = route.eta_minutes {
        line.push_str(&format!(
            " | {} | arrive ~{}",
            format_eta(minutes),
            calculate_eta_time(minutes)
        ));
    }
    if let Some(km) = route.distance_km {
        line.push_str(&format!(" | {km:.1} km"));
    }
    line
}

fn stop_line(stop: &Stop, eta_label: &str) -> String {
    let status = match stop.status {
        StopStatus::Pending => "",
        StopStatus::Arrived => " [arrived]",
        StopStatus::Completed => " [done]",
    };
    format!(
        "{} {} - {} (in {}){}",
        stop.stop_type,
        stop.display_name(),
        stop.address,
        eta_label,
        status
    )
}

/// Exact name match first, otherwise the top search hit
fn pick_city(name: &str, results: &[City]) -> Option<City> {
    results
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
        .or_else(|| results.first())
        .cloned()
}
