use wasm_bindgen_futures::spawn_local;
use web_sys::InputEvent;
use yew::prelude::*;

use crate::aggregate::{local_today, totals};
use crate::api::{self, EntriesResponse, Entry, EntryResponse};
use crate::format::format_currency;
use crate::toast::ToastHandle;
use crate::validate::parse_positive_amount;
use crate::{icon_credit_card, icon_plus, icon_refresh, icon_trending_up, icon_wallet, page_shell};

fn source_label(entry: &Entry) -> &'static str {
    match entry.source.as_deref() {
        Some("voice") => "Voice",
        Some("bill_upload") => "Bill",
        _ => "Manual",
    }
}

#[function_component(DashboardPage)]
pub fn dashboard_page() -> Html {
    let toast = use_context::<ToastHandle>().unwrap_or_default();

    let entries = use_state(Vec::<Entry>::new);
    let loading = use_state(|| true);
    let show_add = use_state(|| false);

    let form_entry_type = use_state(|| "income".to_string());
    let form_amount = use_state(|| "".to_string());
    let form_note = use_state(|| "".to_string());
    let form_error = use_state(|| None::<String>);
    let saving = use_state(|| false);

    {
        let entries = entries.clone();
        let loading = loading.clone();
        use_effect_with_deps(
            move |_| {
                spawn_local(async move {
                    if let Ok(resp) = api::get_json::<EntriesResponse>("/api/entries").await {
                        entries.set(resp.entries);
                    }
                    loading.set(false);
                });
                || ()
            },
            (),
        );
    }

    let on_refresh = {
        let entries = entries.clone();
        let loading = loading.clone();
        let toast = toast.clone();
        Callback::from(move |_| {
            let entries = entries.clone();
            let loading = loading.clone();
            let toast = toast.clone();
            loading.set(true);
            spawn_local(async move {
                match api::get_json::<EntriesResponse>("/api/entries").await {
                    Ok(resp) => entries.set(resp.entries),
                    Err(msg) => toast.error(msg),
                }
                loading.set(false);
            });
        })
    };

    let on_toggle_add = {
        let show_add = show_add.clone();
        let form_error = form_error.clone();
        Callback::from(move |_| {
            show_add.set(!*show_add);
            form_error.set(None);
        })
    };

    let on_submit = {
        let entries = entries.clone();
        let show_add = show_add.clone();
        let form_entry_type = form_entry_type.clone();
        let form_amount = form_amount.clone();
        let form_note = form_note.clone();
        let form_error = form_error.clone();
        let saving = saving.clone();
        let toast = toast.clone();

        Callback::from(move |_| {
            let amount = match parse_positive_amount(&form_amount) {
                Ok(amount) => amount,
                Err(msg) => {
                    form_error.set(Some(msg));
                    return;
                }
            };

            form_error.set(None);
            saving.set(true);

            let entries = entries.clone();
            let show_add = show_add.clone();
            let form_entry_type = form_entry_type.clone();
            let form_amount = form_amount.clone();
            let form_note = form_note.clone();
            let form_error = form_error.clone();
            let saving = saving.clone();
            let toast = toast.clone();

            spawn_local(async move {
                let payload = serde_json::json!({
                    "entry_type": (*form_entry_type).clone(),
                    "amount": amount,
                    "note": form_note.trim(),
                });

                match api::post_json::<EntryResponse, _>("/api/entries", &payload).await {
                    Ok(resp) => {
                        let mut next = (*entries).clone();
                        next.insert(0, resp.entry);
                        entries.set(next);
                        form_amount.set("".to_string());
                        form_note.set("".to_string());
                        show_add.set(false);
                        toast.success("Entry saved.");
                    }
                    Err(msg) => {
                        form_error.set(Some(msg));
                    }
                }
                saving.set(false);
            });
        })
    };

    let t = totals(&entries, &local_today());

    html! {
        { page_shell(
            "Dashboard",
            html! {
                <div class="flex items-center gap-2">
                    <button onclick={on_refresh} class="flex items-center gap-2 bg-secondary text-secondary-foreground px-4 py-2 rounded-xl font-bold text-sm hover:opacity-90 transition-all">
                        { icon_refresh() }
                        {"Refresh"}
                    </button>
                    <button onclick={on_toggle_add} class="flex items-center gap-2 bg-primary text-primary-foreground px-4 py-2 rounded-xl font-bold text-sm hover:opacity-90 transition-all">
                        { icon_plus() }
                        { if *show_add { "Close" } else { "Add Entry" } }
                    </button>
                </div>
            },
            html! {
                <>
                    <div class="grid grid-cols-1 md:grid-cols-3 gap-6">
                        <StatCard title="Total Income" value={t.income} icon={icon_trending_up()} />
                        <StatCard title="Total Expenses" value={t.expense} icon={icon_credit_card()} />
                        <StatCard title="Net Cash" value={t.net} icon={icon_wallet()} />
                    </div>

                    <div class="grid grid-cols-1 md:grid-cols-2 gap-6">
                        <div class="bg-card rounded-[10px] p-6 border border-border">
                            <p class="text-sm text-muted-foreground mb-2">{"Today's Income"}</p>
                            <h3 class="text-2xl font-bold text-foreground">{ format_currency(t.today_income) }</h3>
                        </div>
                        <div class="bg-card rounded-[10px] p-6 border border-border">
                            <p class="text-sm text-muted-foreground mb-2">{"Today's Expenses"}</p>
                            <h3 class="text-2xl font-bold text-foreground">{ format_currency(t.today_expense) }</h3>
                        </div>
                    </div>

                    {
                        if *show_add {
                            html! {
                                <div class="bg-card rounded-[10px] p-6 border border-border">
                                    <div class="grid grid-cols-1 md:grid-cols-4 gap-3">
                                        <select value={(*form_entry_type).clone()} onchange={{
                                            let form_entry_type = form_entry_type.clone();
                                            Callback::from(move |e: Event| {
                                                let input: web_sys::HtmlSelectElement = e.target_unchecked_into();
                                                form_entry_type.set(input.value());
                                            })
                                        }} class="p-2 border rounded">
                                            <option value="income">{"Income"}</option>
                                            <option value="expense">{"Expense"}</option>
                                        </select>
                                        <input placeholder="Amount (₹)" value={(*form_amount).clone()} oninput={{
                                            let form_amount = form_amount.clone();
                                            Callback::from(move |e: InputEvent| {
                                                let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                                                form_amount.set(input.value());
                                            })
                                        }} class="p-2 border rounded" />
                                        <input placeholder="Note (optional)" value={(*form_note).clone()} oninput={{
                                            let form_note = form_note.clone();
                                            Callback::from(move |e: InputEvent| {
                                                let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                                                form_note.set(input.value());
                                            })
                                        }} class="p-2 border rounded" />
                                        <button onclick={on_submit} class="bg-accent text-white px-4 rounded" disabled={*saving}>
                                            { if *saving { "Saving..." } else { "Save" } }
                                        </button>
                                    </div>
                                    {
                                        if let Some(msg) = &*form_error {
                                            html! { <p class="text-sm text-red-500 mt-3">{ msg.clone() }</p> }
                                        } else {
                                            html! {}
                                        }
                                    }
                                </div>
                            }
                        } else { html!{} }
                    }

                    <div class="bg-card rounded-[10px] shadow-sm border border-border overflow-hidden">
                        <div class="p-6 flex justify-between items-center border-b border-border">
                            <h3 class="font-bold text-foreground text-lg">{"Ledger"}</h3>
                        </div>
                        <div class="overflow-x-auto">
                            <table class="w-full text-left border-collapse">
                                <thead>
                                    <tr class="bg-muted/50 text-muted-foreground text-[10px] uppercase tracking-widest">
                                        <th class="px-8 py-4 font-bold">{"Date"}</th>
                                        <th class="px-8 py-4 font-bold">{"Note"}</th>
                                        <th class="px-8 py-4 font-bold">{"Source"}</th>
                                        <th class="px-8 py-4 font-bold text-right">{"Amount"}</th>
                                    </tr>
                                </thead>
                                <tbody class="divide-y divide-border">
                                    { if *loading {
                                        html! { <tr><td colspan="4" class="px-8 py-6 text-center text-muted-foreground">{"Loading..."}</td></tr> }
                                    } else if entries.is_empty() {
                                        html! { <tr><td colspan="4" class="px-8 py-6 text-center text-muted-foreground">{"No entries yet. Add one, speak one, or upload a bill."}</td></tr> }
                                    } else {
                                        html! {
                                            <>
                                                { for entries.iter().map(|entry| {
                                                    let amount_label = if entry.entry_type == "income" {
                                                        format!("+ {}", format_currency(entry.amount))
                                                    } else {
                                                        format!("- {}", format_currency(entry.amount))
                                                    };
                                                    let amount_class = if entry.entry_type == "income" {
                                                        "px-8 py-4 text-right font-semibold text-emerald-600"
                                                    } else {
                                                        "px-8 py-4 text-right font-semibold text-red-600"
                                                    };
                                                    html! {
                                                        <tr key={entry.id} class="text-sm hover:bg-muted/30 transition-colors">
                                                            <td class="px-8 py-4 text-muted-foreground">{ entry.created_at.clone().unwrap_or_default() }</td>
                                                            <td class="px-8 py-4 text-foreground">{ entry.note.clone().unwrap_or_default() }</td>
                                                            <td class="px-8 py-4">
                                                                <span class="bg-secondary text-secondary-foreground px-3 py-1 rounded-full text-[10px] font-bold">{ source_label(entry) }</span>
                                                            </td>
                                                            <td class={amount_class}>{ amount_label }</td>
                                                        </tr>
                                                    }
                                                }) }
                                            </>
                                        }
                                    }}
                                </tbody>
                            </table>
                        </div>
                    </div>
                </>
            }
        ) }
    }
}

#[derive(Properties, PartialEq)]
struct StatCardProps {
    title: &'static str,
    value: f64,
    icon: Html,
}

#[function_component(StatCard)]
fn stat_card(props: &StatCardProps) -> Html {
    html! {
        <div class="bg-card p-6 rounded-[10px] shadow-sm border border-border flex justify-between items-start">
            <div>
                <p class="text-muted-foreground text-[10px] font-bold mb-1 tracking-widest">{ props.title }</p>
                <h3 class="text-2xl font-bold text-[#1D617A] tracking-tight">{ format_currency(props.value) }</h3>
            </div>
            <div class="p-3 bg-[#eef4f9] rounded-[10px]">
                { props.icon.clone() }
            </div>
        </div>
    }
}
